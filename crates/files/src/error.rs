//! Error types for file helpers.

use std::path::PathBuf;

/// Result type for file helpers.
pub type Result<T> = std::result::Result<T, FilesError>;

/// File helper errors.
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// Filesystem access failed
    #[error("{path}: {source}")]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A table row has more cells than the header
    #[error("{path}:{line}: expected at most {expected} cells, found {found}")]
    Malformed {
        /// Table file
        path: PathBuf,
        /// 1-based line number
        line: usize,
        /// Cells in the header
        expected: usize,
        /// Cells in the row
        found: usize,
    },

    /// A table file has no header row
    #[error("{0}: missing header row")]
    MissingHeader(PathBuf),

    /// The folder has no name to derive an output file from
    #[error("cannot name an output file after {0}")]
    NoFolderName(PathBuf),

    /// Nothing to combine
    #[error("no tables found under {0}")]
    NoTables(PathBuf),
}

impl FilesError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
