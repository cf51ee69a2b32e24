//! Dispatch configuration.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// Default number of workers allowed to run at the same time.
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// A validated, strictly positive concurrency ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConcurrencyLimit(NonZeroUsize);

impl ConcurrencyLimit {
    /// Validate a raw limit. Zero and negative values are rejected.
    pub fn new(raw: i64) -> Result<Self> {
        usize::try_from(raw)
            .ok()
            .and_then(NonZeroUsize::new)
            .map(Self)
            .ok_or(ConfigError::InvalidConcurrency(raw))
    }

    /// Number of worker slots.
    pub fn get(&self) -> usize {
        self.0.get()
    }
}

impl Default for ConcurrencyLimit {
    fn default() -> Self {
        Self(NonZeroUsize::MIN.saturating_add(DEFAULT_MAX_CONCURRENCY - 1))
    }
}

impl From<NonZeroUsize> for ConcurrencyLimit {
    fn from(value: NonZeroUsize) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for ConcurrencyLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Options controlling one dispatch run.
///
/// `max_concurrency` is kept raw so that a bad value coming from a file or a
/// flag is reported as a configuration error when the run starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Maximum number of workers alive at the same time
    pub max_concurrency: i64,

    /// Emit progress lines and run markers
    pub print_progress: bool,

    /// Display label for the run; defaults to the work's name
    pub process_name: Option<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY as i64,
            print_progress: true,
            process_name: None,
        }
    }
}

impl DispatchConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the concurrency ceiling.
    pub fn with_max_concurrency(mut self, max: i64) -> Self {
        self.max_concurrency = max;
        self
    }

    /// Enable or disable progress output.
    pub fn with_progress(mut self, print_progress: bool) -> Self {
        self.print_progress = print_progress;
        self
    }

    /// Set the display label.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.process_name = Some(name.into());
        self
    }

    /// Validate the config, returning the concurrency limit to use.
    pub fn validate(&self) -> Result<ConcurrencyLimit> {
        ConcurrencyLimit::new(self.max_concurrency)
    }

    /// Label for the run, falling back to `default_name`.
    pub fn label<'a>(&'a self, default_name: &'a str) -> &'a str {
        self.process_name.as_deref().unwrap_or(default_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concurrency_limit_rejects_non_positive() {
        assert!(matches!(
            ConcurrencyLimit::new(0),
            Err(ConfigError::InvalidConcurrency(0))
        ));
        assert!(matches!(
            ConcurrencyLimit::new(-3),
            Err(ConfigError::InvalidConcurrency(-3))
        ));
        assert_eq!(ConcurrencyLimit::new(3).unwrap().get(), 3);
    }

    #[test]
    fn test_defaults() {
        let config = DispatchConfig::default();
        assert_eq!(config.max_concurrency, 8);
        assert!(config.print_progress);
        assert_eq!(config.process_name, None);
        assert_eq!(ConcurrencyLimit::default().get(), DEFAULT_MAX_CONCURRENCY);
        assert_eq!(config.validate().unwrap(), ConcurrencyLimit::default());
    }

    #[test]
    fn test_label_falls_back_to_work_name() {
        let config = DispatchConfig::new();
        assert_eq!(config.label("segment"), "segment");

        let config = config.with_name("thresholding");
        assert_eq!(config.label("segment"), "thresholding");
    }

    #[test]
    fn test_deserialize_partial() {
        let config: DispatchConfig =
            serde_json::from_str(r#"{"max_concurrency": 2, "print_progress": false}"#).unwrap();
        assert_eq!(config.max_concurrency, 2);
        assert!(!config.print_progress);
        assert_eq!(config.process_name, None);
    }
}
