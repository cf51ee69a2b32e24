//! File extension filters.

use serde::{Deserialize, Serialize};

/// Extensions of the image formats picked up by default.
pub const IMAGE_EXTENSIONS: [&str; 12] = [
    "png", "jpg", "jpeg", "bmp", "tif", "tiff", "PNG", "JPG", "JPEG", "BMP", "TIF", "TIFF",
];

/// Wildcard entry that accepts every file.
const ANY: &str = "*";

/// A set of accepted file extensions, without the leading dot.
///
/// Matching is case-sensitive and looks at the text after the last `.` of the
/// file name only, so `scan.ome.tif` has the extension `tif` and a name
/// without a dot has the empty extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Extensions(Vec<String>);

impl Extensions {
    /// Accept exactly the given extensions.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            extensions
                .into_iter()
                .map(Into::into)
                .map(|e: String| e.trim_start_matches('.').to_string())
                .collect(),
        )
    }

    /// Common image formats, in lower and upper case.
    pub fn images() -> Self {
        Self::new(IMAGE_EXTENSIONS)
    }

    /// Accept every file.
    pub fn any() -> Self {
        Self::new([ANY])
    }

    /// Whether `file_name` has an accepted extension.
    pub fn matches(&self, file_name: &str) -> bool {
        let ext = file_name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
        self.0.iter().any(|e| e == ANY || e == ext)
    }

    /// The accepted extensions.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl Default for Extensions {
    fn default() -> Self {
        Self::images()
    }
}

impl std::str::FromStr for Extensions {
    type Err = std::convert::Infallible;

    /// Parse a comma-separated list such as `tif,tiff`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(
            s.split(',').map(str::trim).filter(|e| !e.is_empty()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_images_are_case_sensitive_pairs() {
        let images = Extensions::images();
        assert!(images.matches("cell.tif"));
        assert!(images.matches("CELL.TIF"));
        assert!(images.matches("a.b.jpeg"));
        assert!(!images.matches("cell.Tif"));
        assert!(!images.matches("table.csv"));
        assert!(!images.matches("README"));
    }

    #[test]
    fn test_last_extension_only() {
        let csv = Extensions::new(["csv"]);
        assert!(csv.matches("stats.csv"));
        assert!(!csv.matches("stats.csv.bak"));
        assert!(!csv.matches("csv"));
    }

    #[test]
    fn test_empty_extension() {
        let bare = Extensions::new([""]);
        assert!(bare.matches("Makefile"));
        assert!(bare.matches("trailing."));
        assert!(!bare.matches("main.rs"));
    }

    #[test]
    fn test_wildcard() {
        let all = Extensions::any();
        assert!(all.matches("anything.xyz"));
        assert!(all.matches("noext"));

        let mixed = Extensions::new(["png", "*"]);
        assert!(mixed.matches("x.csv"));
    }

    #[test]
    fn test_parse_list() {
        let exts: Extensions = "tif, .tiff,,csv".parse().unwrap();
        assert_eq!(exts.as_slice(), &["tif", "tiff", "csv"]);
        assert_eq!(Extensions::default(), Extensions::images());
    }
}
