//! Execution layer - bounded fan-out of tasks over pluggable workers.
//!
//! [`TaskDispatcher`] keeps at most `max_concurrency` workers alive, launches
//! tasks in input order, and waits on a completion channel for slots to free
//! up. How a worker runs is decided by an [`ExecutionStrategy`]:
//!
//! - [`ProcessStrategy`] spawns an OS process per task
//! - [`ThreadStrategy`] runs the work on a dedicated OS thread
//! - [`TaskStrategy`] runs the work as a tokio task

#![warn(missing_docs)]

pub mod completion;
pub mod dispatcher;
pub mod process;
pub mod scheduler;
pub mod strategy;
pub mod task;
pub mod thread;

pub use completion::{CompletionSender, LOST_WORKER};
pub use dispatcher::{log_summary, DispatchError, TaskDispatcher};
pub use process::ProcessStrategy;
pub use scheduler::WorkerPool;
pub use strategy::{ExecutionStrategy, LaunchError, StrategyKind};
pub use task::TaskStrategy;
pub use thread::ThreadStrategy;
