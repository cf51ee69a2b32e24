//! fanout core data models.
//!
//! This crate defines the types shared by the dispatcher, the execution
//! strategies and the progress reporting: tasks, worker handles, outcomes,
//! run summaries and dispatch configuration.

#![warn(missing_docs)]

// Identities
mod id;

// Work units
mod task;
mod worker;
mod summary;

// Configuration and errors
mod config;
mod error;

// Re-exports
pub use id::{RunId, TaskId};
pub use task::{value_text, ExtraParams, Task};
pub use worker::{TaskCompletion, TaskOutcome, WorkerHandle, WorkerState};
pub use summary::RunSummary;
pub use config::{ConcurrencyLimit, DispatchConfig, DEFAULT_MAX_CONCURRENCY};
pub use error::{ConfigError, FailedRun, Result};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
