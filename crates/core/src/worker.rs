//! Worker handles and the outcomes they report.

use crate::id::TaskId;
use crate::Time;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a launched worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkerState {
    /// The worker is executing its task
    Running,
    /// The worker reported completion
    Finished,
}

/// A live reference to a worker executing one task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerHandle {
    /// Task the worker executes
    pub task_id: TaskId,

    /// Name of the execution strategy that launched it
    pub runner: String,

    /// OS process id, for process workers
    pub pid: Option<u32>,

    /// Current state
    pub state: WorkerState,

    /// When the worker was launched
    pub launched_at: Time,
}

impl WorkerHandle {
    /// Create a handle for a freshly launched worker.
    pub fn running(task_id: TaskId, runner: impl Into<String>) -> Self {
        Self {
            task_id,
            runner: runner.into(),
            pid: None,
            state: WorkerState::Running,
            launched_at: chrono::Utc::now(),
        }
    }

    /// Attach an OS process id.
    pub fn with_pid(mut self, pid: Option<u32>) -> Self {
        self.pid = pid;
        self
    }

    /// Mark the worker finished.
    pub fn finish(&mut self) {
        self.state = WorkerState::Finished;
    }

    /// Whether the worker is still running.
    pub fn is_running(&self) -> bool {
        self.state == WorkerState::Running
    }
}

/// What a worker reported when it finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskOutcome {
    /// The work completed normally
    Succeeded,
    /// The work returned an error, panicked, crashed or could not be launched
    Failed {
        /// Human-readable failure description
        error: String,
    },
}

impl TaskOutcome {
    /// Build a failure outcome.
    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed {
            error: error.into(),
        }
    }

    /// Whether the work succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Succeeded)
    }

    /// Failure message, if any.
    pub fn error(&self) -> Option<&str> {
        match self {
            TaskOutcome::Succeeded => None,
            TaskOutcome::Failed { error } => Some(error),
        }
    }
}

/// A completion message sent by a worker through the completion channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCompletion {
    /// Task that finished
    pub task_id: TaskId,

    /// How it finished
    pub outcome: TaskOutcome,

    /// When the completion was signalled
    pub finished_at: Time,
}

impl TaskCompletion {
    /// Create a completion stamped with the current time.
    pub fn new(task_id: TaskId, outcome: TaskOutcome) -> Self {
        Self {
            task_id,
            outcome,
            finished_at: chrono::Utc::now(),
        }
    }
}
