//! Aggregated outcome of a dispatch run.

use crate::error::FailedRun;
use crate::id::{RunId, TaskId};
use crate::worker::{TaskCompletion, TaskOutcome};
use crate::Time;
use serde::{Deserialize, Serialize};

/// Everything the dispatcher observed during one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Unique identifier
    pub run_id: RunId,

    /// Display label
    pub name: String,

    /// Number of tasks submitted
    pub total: usize,

    /// Tasks in the order they were launched
    pub launch_order: Vec<TaskId>,

    /// Completions in the order they were observed
    pub completions: Vec<TaskCompletion>,

    /// Largest number of workers observed alive at once
    #[serde(default)]
    pub peak_active: usize,

    /// When the run started
    pub started_at: Time,

    /// When the last task finished
    pub finished_at: Time,
}

impl RunSummary {
    /// Create an empty summary for a run that is starting now.
    pub fn start(run_id: RunId, name: impl Into<String>, total: usize) -> Self {
        let now = chrono::Utc::now();
        Self {
            run_id,
            name: name.into(),
            total,
            launch_order: Vec::with_capacity(total),
            completions: Vec::with_capacity(total),
            peak_active: 0,
            started_at: now,
            finished_at: now,
        }
    }

    /// Number of tasks that finished, successfully or not.
    pub fn completed(&self) -> usize {
        self.completions.len()
    }

    /// Number of successful tasks.
    pub fn succeeded_count(&self) -> usize {
        self.completions
            .iter()
            .filter(|c| c.outcome.is_success())
            .count()
    }

    /// Number of failed tasks.
    pub fn failed_count(&self) -> usize {
        self.completed() - self.succeeded_count()
    }

    /// Failed tasks with their error message, in completion order.
    pub fn failures(&self) -> impl Iterator<Item = (TaskId, &str)> + '_ {
        self.completions
            .iter()
            .filter_map(|c| c.outcome.error().map(|e| (c.task_id, e)))
    }

    /// Outcome recorded for a task.
    pub fn outcome(&self, task_id: TaskId) -> Option<&TaskOutcome> {
        self.completions
            .iter()
            .find(|c| c.task_id == task_id)
            .map(|c| &c.outcome)
    }

    /// Whether every task finished and none failed.
    pub fn is_success(&self) -> bool {
        self.completed() == self.total && self.failed_count() == 0
    }

    /// Wall-clock duration of the run.
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// Turn any task failure into an error.
    pub fn into_result(self) -> Result<RunSummary, FailedRun> {
        let failed = self.failed_count();
        if failed == 0 {
            Ok(self)
        } else {
            Err(FailedRun {
                name: self.name.clone(),
                failed,
                total: self.total,
                summary: self,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary_with(outcomes: Vec<TaskOutcome>) -> RunSummary {
        let mut summary = RunSummary::start(RunId::new(), "segment", outcomes.len());
        for (index, outcome) in outcomes.into_iter().enumerate() {
            summary.launch_order.push(TaskId::new(index));
            summary
                .completions
                .push(TaskCompletion::new(TaskId::new(index), outcome));
        }
        summary
    }

    #[test]
    fn test_all_succeeded() {
        let summary = summary_with(vec![TaskOutcome::Succeeded, TaskOutcome::Succeeded]);

        assert_eq!(summary.completed(), 2);
        assert_eq!(summary.failed_count(), 0);
        assert!(summary.is_success());
        assert!(summary.into_result().is_ok());
    }

    #[test]
    fn test_failures_are_surfaced() {
        let summary = summary_with(vec![
            TaskOutcome::Succeeded,
            TaskOutcome::failed("panicked"),
            TaskOutcome::Succeeded,
        ]);

        assert_eq!(summary.succeeded_count(), 2);
        assert_eq!(summary.failed_count(), 1);
        assert!(!summary.is_success());

        let failures: Vec<_> = summary.failures().collect();
        assert_eq!(failures, vec![(TaskId::new(1), "panicked")]);
        assert_eq!(
            summary.outcome(TaskId::new(1)),
            Some(&TaskOutcome::failed("panicked"))
        );

        let err = summary.into_result().unwrap_err();
        assert_eq!(err.failed, 1);
        assert_eq!(err.to_string(), "1 of 3 tasks failed in 'segment'");
    }

    #[test]
    fn test_incomplete_run_is_not_success() {
        let mut summary = summary_with(vec![TaskOutcome::Succeeded]);
        summary.total = 2;
        assert!(!summary.is_success());
    }
}
