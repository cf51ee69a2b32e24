//! Execution strategies - how a worker is started for one task.

use crate::completion::CompletionSender;
use fanout_core::{Task, WorkerHandle};
use fanout_work::TemplateError;
use std::any::Any;

/// Errors that prevent a worker from starting.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    /// The command could not be rendered for this task
    #[error("invalid command for task: {0}")]
    Template(#[from] TemplateError),

    /// The OS refused to start the process or thread
    #[error("failed to spawn {what}: {source}")]
    Spawn {
        /// What was being spawned
        what: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// Starts one worker per task.
///
/// `launch` must return without waiting for the work to finish. The worker
/// reports through `done` when it is over; if the token is dropped instead,
/// a failure is reported on its behalf.
pub trait ExecutionStrategy: Send + Sync {
    /// Strategy label, used as the default run name.
    fn name(&self) -> &str;

    /// Start a worker for `task`.
    fn launch(&self, task: Task, done: CompletionSender) -> Result<WorkerHandle, LaunchError>;
}

impl<S: ExecutionStrategy + ?Sized> ExecutionStrategy for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn launch(&self, task: Task, done: CompletionSender) -> Result<WorkerHandle, LaunchError> {
        (**self).launch(task, done)
    }
}

/// Strategies available from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// One OS process per task
    Process,
    /// One OS thread per task
    Thread,
    /// One tokio task per task
    Task,
}

impl StrategyKind {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Process => "process",
            StrategyKind::Thread => "thread",
            StrategyKind::Task => "task",
        }
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "process" => Ok(StrategyKind::Process),
            "thread" => Ok(StrategyKind::Thread),
            "task" => Ok(StrategyKind::Task),
            other => Err(format!("unknown strategy '{other}' (expected process, thread or task)")),
        }
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_kind_parse() {
        assert_eq!("process".parse::<StrategyKind>(), Ok(StrategyKind::Process));
        assert_eq!("Thread".parse::<StrategyKind>(), Ok(StrategyKind::Thread));
        assert_eq!("task".parse::<StrategyKind>(), Ok(StrategyKind::Task));
        assert!("fiber".parse::<StrategyKind>().is_err());
        assert_eq!(StrategyKind::Thread.as_str(), "thread");
    }

    #[test]
    fn test_panic_message() {
        assert_eq!(panic_message(Box::new("boom")), "panicked: boom");
        assert_eq!(panic_message(Box::new(String::from("bad item"))), "panicked: bad item");
        assert_eq!(panic_message(Box::new(42u8)), "panicked");
    }
}
