//! Destinations for progress emissions.

use crate::tracker::{ProgressReport, START_TIME_FORMAT};
use chrono::{DateTime, Local};
use std::sync::Mutex;
use tracing::info;

/// Receives run markers and one report per completed task.
pub trait ProgressSink: Send + Sync {
    /// A run with `total` tasks started.
    fn run_started(&self, _name: &str, _total: usize, _started_at: DateTime<Local>) {}

    /// A task finished.
    fn task_completed(&self, report: &ProgressReport);

    /// Every task of the run finished.
    fn run_finished(&self, _name: &str) {}
}

/// Emits progress through `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn run_started(&self, name: &str, total: usize, started_at: DateTime<Local>) {
        info!(tasks = total, "Run {}", name);
        info!("started at {}", started_at.format(START_TIME_FORMAT));
    }

    fn task_completed(&self, report: &ProgressReport) {
        info!("{}", report);
    }

    fn run_finished(&self, name: &str) {
        info!("{} done", name);
    }
}

/// Adapts a closure into a sink that only sees completion reports.
pub struct FnSink<F>(pub F);

impl<F> ProgressSink for FnSink<F>
where
    F: Fn(&ProgressReport) + Send + Sync,
{
    fn task_completed(&self, report: &ProgressReport) {
        (self.0)(report)
    }
}

/// Event recorded by [`CollectingSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Run start marker
    Started {
        /// Run label
        name: String,
        /// Task count
        total: usize,
    },
    /// One completion
    Completed(ProgressReport),
    /// Run end marker
    Finished {
        /// Run label
        name: String,
    },
}

/// Keeps every emission in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl CollectingSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far.
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Only the completion reports.
    pub fn reports(&self) -> Vec<ProgressReport> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::Completed(report) => Some(report),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl ProgressSink for CollectingSink {
    fn run_started(&self, name: &str, total: usize, _started_at: DateTime<Local>) {
        self.push(ProgressEvent::Started {
            name: name.to_string(),
            total,
        });
    }

    fn task_completed(&self, report: &ProgressReport) {
        self.push(ProgressEvent::Completed(report.clone()));
    }

    fn run_finished(&self, name: &str) {
        self.push(ProgressEvent::Finished {
            name: name.to_string(),
        });
    }
}
