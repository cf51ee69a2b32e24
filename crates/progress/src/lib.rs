//! Progress Tracking
//!
//! Completion percentage, remaining-time estimation and progress emission
//! for dispatch runs.

#![warn(missing_docs)]

pub mod tracker;
pub mod estimator;
pub mod sink;

pub use tracker::{report, ProgressReport, ProgressTracker, START_TIME_FORMAT};
pub use estimator::{Eta, ProgressSample, TimeUnit};
pub use sink::{CollectingSink, FnSink, LogSink, ProgressEvent, ProgressSink};
