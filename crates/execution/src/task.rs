//! Task strategy - each task runs as a tokio task on the current runtime.

use crate::completion::CompletionSender;
use crate::strategy::{panic_message, ExecutionStrategy, LaunchError};
use fanout_core::{Task, TaskOutcome, WorkerHandle};
use fanout_work::Work;
use std::sync::Arc;

/// Lightweight in-runtime workers, suited to I/O-bound work.
#[derive(Clone)]
pub struct TaskStrategy {
    work: Arc<dyn Work>,
}

impl TaskStrategy {
    /// Create a strategy running `work`.
    pub fn new(work: Arc<dyn Work>) -> Self {
        Self { work }
    }
}

impl ExecutionStrategy for TaskStrategy {
    fn name(&self) -> &str {
        self.work.name()
    }

    fn launch(&self, task: Task, done: CompletionSender) -> Result<WorkerHandle, LaunchError> {
        let work = Arc::clone(&self.work);
        let task_id = task.id;

        let worker = tokio::spawn(async move { work.execute(&task).await });
        tokio::spawn(async move {
            let outcome = match worker.await {
                Ok(Ok(())) => TaskOutcome::Succeeded,
                Ok(Err(e)) => TaskOutcome::failed(format!("{e:#}")),
                Err(e) if e.is_panic() => TaskOutcome::failed(panic_message(e.into_panic())),
                Err(e) => TaskOutcome::failed(e.to_string()),
            };
            done.finish(outcome);
        });

        Ok(WorkerHandle::running(task_id, "task"))
    }
}
