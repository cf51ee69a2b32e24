//! Errors shared across the workspace.

use crate::summary::RunSummary;

/// Result alias for configuration handling.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration errors, detected before any worker is launched.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The concurrency limit was zero or negative
    #[error("max concurrency must be a positive integer, got {0}")]
    InvalidConcurrency(i64),

    /// The item list was not a sequence
    #[error("items must be a sequence, got {0}")]
    ItemsNotSequence(String),

    /// Extra parameters were not a mapping
    #[error("params must be a mapping, got {0}")]
    ParamsNotMapping(String),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error while reading configuration
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A run completed but at least one task failed.
#[derive(Debug, thiserror::Error)]
#[error("{failed} of {total} tasks failed in '{name}'")]
pub struct FailedRun {
    /// Run label
    pub name: String,

    /// Number of failed tasks
    pub failed: usize,

    /// Number of tasks in the run
    pub total: usize,

    /// The full summary of the run
    pub summary: RunSummary,
}
