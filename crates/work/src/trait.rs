//! Work abstraction.

use async_trait::async_trait;
use fanout_core::Task;

/// The per-item work function a dispatch run applies to every task.
///
/// Implementations persist their own results (for example by writing a file
/// whose name depends only on the task's item). The return value only tells
/// the dispatcher whether the task succeeded.
#[async_trait]
pub trait Work: Send + Sync {
    /// Get work name, used as the default run label.
    fn name(&self) -> &str;

    /// Process one task.
    async fn execute(&self, task: &Task) -> Result<(), anyhow::Error>;
}

/// A named synchronous closure used as work.
///
/// The closure runs on whatever worker executes the task; long CPU-bound
/// closures belong on the thread strategy.
pub struct FnWork<F> {
    name: String,
    f: F,
}

impl<F> FnWork<F>
where
    F: Fn(&Task) -> Result<(), anyhow::Error> + Send + Sync,
{
    /// Wrap a closure.
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

#[async_trait]
impl<F> Work for FnWork<F>
where
    F: Fn(&Task) -> Result<(), anyhow::Error> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, task: &Task) -> Result<(), anyhow::Error> {
        (self.f)(task)
    }
}
