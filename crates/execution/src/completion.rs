//! Completion channel shared by all workers of a run.

use fanout_core::{TaskCompletion, TaskId, TaskOutcome};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Outcome reported when a worker goes away without reporting.
pub const LOST_WORKER: &str = "worker exited without reporting an outcome";

/// Create the channel a run's workers report through.
pub(crate) fn completion_channel() -> (UnboundedSender<TaskCompletion>, UnboundedReceiver<TaskCompletion>) {
    mpsc::unbounded_channel()
}

/// Token a worker uses to report its outcome, exactly once.
///
/// Dropping the token without calling [`CompletionSender::finish`] reports a
/// failure, so a worker that dies mid-task still frees its slot.
#[derive(Debug)]
pub struct CompletionSender {
    task_id: TaskId,
    tx: Option<UnboundedSender<TaskCompletion>>,
}

impl CompletionSender {
    pub(crate) fn new(task_id: TaskId, tx: UnboundedSender<TaskCompletion>) -> Self {
        Self {
            task_id,
            tx: Some(tx),
        }
    }

    /// Task this token reports for.
    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Report the outcome and consume the token.
    pub fn finish(mut self, outcome: TaskOutcome) {
        self.send(outcome);
    }

    fn send(&mut self, outcome: TaskOutcome) {
        if let Some(tx) = self.tx.take() {
            // The receiver only goes away once the run has returned.
            let _ = tx.send(TaskCompletion::new(self.task_id, outcome));
        }
    }
}

impl Drop for CompletionSender {
    fn drop(&mut self) {
        self.send(TaskOutcome::failed(LOST_WORKER));
    }
}
