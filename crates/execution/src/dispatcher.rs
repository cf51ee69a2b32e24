//! The task dispatcher - fans a run's items out over a bounded worker pool.

use crate::completion::{completion_channel, CompletionSender};
use crate::scheduler::WorkerPool;
use crate::strategy::ExecutionStrategy;
use fanout_core::{
    ConfigError, DispatchConfig, ExtraParams, RunId, RunSummary, Task, TaskCompletion,
    TaskOutcome,
};
use fanout_progress::{LogSink, ProgressSink, ProgressTracker};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Errors that stop a run.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Invalid configuration; nothing was launched
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Every completion sender disappeared while workers were still active
    #[error("completion channel closed with {active} workers still running")]
    ChannelClosed {
        /// Workers still in the active set
        active: usize,
    },
}

/// Runs every task of a batch through an execution strategy, never keeping
/// more workers alive than the configured limit.
///
/// ```text
/// launch while slots are free → await a completion → free its slot → report progress
/// ```
///
/// Tasks are launched strictly in input order; they complete in whatever
/// order their workers finish. Launched workers are never cancelled.
pub struct TaskDispatcher<S: ExecutionStrategy> {
    strategy: S,
    config: DispatchConfig,
    sink: Option<Arc<dyn ProgressSink>>,
}

impl<S: ExecutionStrategy> TaskDispatcher<S> {
    /// Create a dispatcher with the default configuration.
    pub fn new(strategy: S) -> Self {
        Self {
            strategy,
            config: DispatchConfig::default(),
            sink: None,
        }
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a progress sink.
    ///
    /// The sink is notified whether or not `print_progress` is enabled;
    /// `print_progress` only controls the built-in log output.
    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// The strategy workers are launched with.
    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// The configuration in use.
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Apply the work to every item, sharing `params` across all tasks.
    pub async fn run<I>(&self, items: I, params: ExtraParams) -> Result<RunSummary, DispatchError>
    where
        I: IntoIterator,
        I::Item: Into<serde_json::Value>,
    {
        self.run_tasks(Task::batch(items, params)).await
    }

    /// Dispatch prepared tasks. Returns once every task has finished.
    pub async fn run_tasks(&self, tasks: Vec<Task>) -> Result<RunSummary, DispatchError> {
        let limit = self.config.validate()?;
        let name = self.config.label(self.strategy.name()).to_string();
        let total = tasks.len();

        let mut summary = RunSummary::start(RunId::new(), name.as_str(), total);
        let tracker = ProgressTracker::start(total);
        self.notify(|sink| sink.run_started(&name, total, tracker.started_at()));
        debug!(run = %summary.run_id, tasks = total, limit = %limit, "Dispatch started");

        if total == 0 {
            self.notify(|sink| sink.task_completed(&tracker.report(0)));
            self.notify(|sink| sink.run_finished(&name));
            return Ok(summary);
        }

        let (tx, mut rx) = completion_channel();
        let mut tx = Some(tx);
        let mut pending: VecDeque<Task> = tasks.into();
        let mut pool = WorkerPool::new(limit);
        let mut completed = 0;

        while completed < total {
            // Launch phase: fill every free slot, in input order.
            while pool.can_start() {
                let Some(tx) = &tx else {
                    break;
                };
                let Some(task) = pending.pop_front() else {
                    break;
                };
                let task_id = task.id;
                summary.launch_order.push(task_id);

                match self
                    .strategy
                    .launch(task, CompletionSender::new(task_id, tx.clone()))
                {
                    Ok(handle) => {
                        debug!(task = %task_id, active = pool.len() + 1, "Launched worker");
                        pool.insert(handle);
                    }
                    Err(e) => {
                        // Never occupied a slot; counts as finished right away.
                        warn!(task = %task_id, error = %e, "Failed to launch worker");
                        completed += 1;
                        summary
                            .completions
                            .push(TaskCompletion::new(task_id, TaskOutcome::failed(e.to_string())));
                        self.notify(|sink| sink.task_completed(&tracker.report(completed)));
                    }
                }
            }

            debug_assert_eq!(completed + pool.len() + pending.len(), total);

            // Once everything is launched, only workers hold senders.
            if pending.is_empty() {
                tx = None;
            }

            if pool.is_empty() {
                continue;
            }

            // Wait phase: the pool is full or draining.
            let Some(completion) = rx.recv().await else {
                error!(active = pool.len(), "Completion channel closed with workers still active");
                return Err(DispatchError::ChannelClosed { active: pool.len() });
            };

            if pool.finish(completion.task_id).is_none() {
                debug!(task = %completion.task_id, "Ignoring completion for inactive task");
                continue;
            }

            completed += 1;
            match &completion.outcome {
                TaskOutcome::Succeeded => debug!(task = %completion.task_id, "Task finished"),
                TaskOutcome::Failed { error } => {
                    warn!(task = %completion.task_id, error = %error, "Task failed")
                }
            }
            summary.completions.push(completion);
            self.notify(|sink| sink.task_completed(&tracker.report(completed)));
        }

        summary.peak_active = pool.peak();
        summary.finished_at = chrono::Utc::now();
        self.notify(|sink| sink.run_finished(&name));

        if summary.failed_count() > 0 {
            warn!(
                run = %summary.run_id,
                failed = summary.failed_count(),
                total,
                "{} finished with failures", name
            );
        } else {
            debug!(run = %summary.run_id, peak_active = summary.peak_active, "Dispatch finished");
        }

        Ok(summary)
    }

    fn notify(&self, emit: impl Fn(&dyn ProgressSink)) {
        if self.config.print_progress {
            let log: &dyn ProgressSink = &LogSink;
            emit(log);
        }
        if let Some(sink) = &self.sink {
            emit(sink.as_ref());
        }
    }
}

impl<S: ExecutionStrategy> std::fmt::Debug for TaskDispatcher<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskDispatcher")
            .field("strategy", &self.strategy.name())
            .field("config", &self.config)
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

/// Log a one-line summary of a finished run.
pub fn log_summary(summary: &RunSummary) {
    info!(
        run = %summary.run_id,
        succeeded = summary.succeeded_count(),
        failed = summary.failed_count(),
        peak_active = summary.peak_active,
        elapsed_ms = summary.duration().num_milliseconds(),
        "{}: {} of {} tasks succeeded",
        summary.name,
        summary.succeeded_count(),
        summary.total
    );
    for (task_id, error) in summary.failures() {
        warn!(task = %task_id, "{}", error);
    }
}
