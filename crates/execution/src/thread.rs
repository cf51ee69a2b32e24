//! Thread strategy - each task runs on its own OS thread.

use crate::completion::CompletionSender;
use crate::strategy::{panic_message, ExecutionStrategy, LaunchError};
use fanout_core::{Task, TaskOutcome, WorkerHandle};
use fanout_work::Work;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use tracing::debug;

/// Runs the work on a dedicated thread with its own current-thread runtime.
///
/// Panics are caught and reported as failures.
#[derive(Clone)]
pub struct ThreadStrategy {
    work: Arc<dyn Work>,
}

impl ThreadStrategy {
    /// Create a strategy running `work`.
    pub fn new(work: Arc<dyn Work>) -> Self {
        Self { work }
    }
}

impl ExecutionStrategy for ThreadStrategy {
    fn name(&self) -> &str {
        self.work.name()
    }

    fn launch(&self, task: Task, done: CompletionSender) -> Result<WorkerHandle, LaunchError> {
        let work = Arc::clone(&self.work);
        let task_id = task.id;

        thread::Builder::new()
            .name(format!("fanout-worker-{}", task_id.index()))
            .spawn(move || {
                let outcome = run_on_thread(work.as_ref(), &task);
                done.finish(outcome);
            })
            .map_err(|source| LaunchError::Spawn {
                what: "worker thread".to_string(),
                source,
            })?;
        debug!(task = %task_id, "Spawned worker thread");

        Ok(WorkerHandle::running(task_id, "thread"))
    }
}

fn run_on_thread(work: &dyn Work, task: &Task) -> TaskOutcome {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => return TaskOutcome::failed(format!("failed to build worker runtime: {e}")),
    };

    match catch_unwind(AssertUnwindSafe(|| runtime.block_on(work.execute(task)))) {
        Ok(Ok(())) => TaskOutcome::Succeeded,
        Ok(Err(e)) => TaskOutcome::failed(format!("{e:#}")),
        Err(payload) => TaskOutcome::failed(panic_message(payload)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::completion_channel;
    use fanout_core::ExtraParams;
    use fanout_work::FnWork;
    use serde_json::json;

    #[tokio::test]
    async fn test_outcomes_from_threads() {
        let work = FnWork::new("check", |task: &Task| match task.item.as_str() {
            Some("ok") => Ok(()),
            Some("err") => anyhow::bail!("bad input"),
            _ => panic!("unexpected item"),
        });
        let strategy = ThreadStrategy::new(Arc::new(work));
        assert_eq!(strategy.name(), "check");

        let (tx, mut rx) = completion_channel();
        let tasks = Task::batch(vec![json!("ok"), json!("err"), json!(7)], ExtraParams::new());
        for task in tasks {
            let done = CompletionSender::new(task.id, tx.clone());
            let handle = strategy.launch(task, done).unwrap();
            assert!(handle.is_running());
        }
        drop(tx);

        let mut outcomes = Vec::new();
        while let Some(c) = rx.recv().await {
            outcomes.push((c.task_id.index(), c.outcome));
        }
        outcomes.sort_by_key(|(index, _)| *index);

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].1, TaskOutcome::Succeeded);
        assert_eq!(outcomes[1].1, TaskOutcome::failed("bad input"));
        assert_eq!(outcomes[2].1, TaskOutcome::failed("panicked: unexpected item"));
    }
}
