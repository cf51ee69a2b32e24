//! Progress tracking for a dispatch run.

use crate::estimator::{Eta, ProgressSample};
use chrono::{DateTime, Local};
use std::time::Instant;

/// Format used for the "started at" marker.
pub const START_TIME_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// A formatted progress status for one completion.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressReport {
    /// Tasks finished so far
    pub completed: usize,
    /// Tasks in the run
    pub total: usize,
    /// Integer percentage finished
    pub percent: usize,
    /// Estimated time left, once something has finished
    pub eta: Option<Eta>,
}

impl ProgressReport {
    /// Build a report from a sample.
    pub fn from_sample(sample: &ProgressSample) -> Self {
        Self {
            completed: sample.completed,
            total: sample.total,
            percent: sample.percent(),
            eta: sample.eta(),
        }
    }
}

impl std::fmt::Display for ProgressReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "done {} of {} ({}%)",
            self.completed, self.total, self.percent
        )?;
        if let Some(eta) = &self.eta {
            write!(f, ", approx. time left: {eta}")?;
        }
        Ok(())
    }
}

/// Compute the progress status after `completed` of `total` tasks, for a
/// run that started at `started`.
pub fn report(completed: usize, total: usize, started: Instant) -> ProgressReport {
    ProgressReport::from_sample(&ProgressSample::new(completed, total, started.elapsed()))
}

/// Tracks one run's start time and total task count.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    total: usize,
    started: Instant,
    started_at: DateTime<Local>,
}

impl ProgressTracker {
    /// Start tracking a run of `total` tasks now.
    pub fn start(total: usize) -> Self {
        Self {
            total,
            started: Instant::now(),
            started_at: Local::now(),
        }
    }

    /// Total task count.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Monotonic start instant.
    pub fn started(&self) -> Instant {
        self.started
    }

    /// Wall-clock start time.
    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    /// Sample progress after `completed` tasks.
    pub fn sample(&self, completed: usize) -> ProgressSample {
        ProgressSample::new(completed, self.total, self.started.elapsed())
    }

    /// Status after `completed` tasks.
    pub fn report(&self, completed: usize) -> ProgressReport {
        report(completed, self.total, self.started)
    }
}
