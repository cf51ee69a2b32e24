//! Worker slot bookkeeping.

use fanout_core::{ConcurrencyLimit, TaskId, WorkerHandle};
use std::collections::BTreeMap;

/// The active set of a run, bounded by a concurrency limit.
#[derive(Debug)]
pub struct WorkerPool {
    limit: ConcurrencyLimit,
    active: BTreeMap<TaskId, WorkerHandle>,
    peak: usize,
}

impl WorkerPool {
    /// Create an empty pool.
    pub fn new(limit: ConcurrencyLimit) -> Self {
        Self {
            limit,
            active: BTreeMap::new(),
            peak: 0,
        }
    }

    /// Check if we can start a new worker.
    pub fn can_start(&self) -> bool {
        self.active.len() < self.limit.get()
    }

    /// Register a launched worker.
    ///
    /// Callers check [`WorkerPool::can_start`] first; the limit is never
    /// exceeded.
    pub fn insert(&mut self, handle: WorkerHandle) {
        debug_assert!(self.can_start(), "worker pool over capacity");
        self.active.insert(handle.task_id, handle);
        self.peak = self.peak.max(self.active.len());
    }

    /// Remove a worker that reported completion.
    ///
    /// Returns `None` when the task is not in the active set.
    pub fn finish(&mut self, task_id: TaskId) -> Option<WorkerHandle> {
        let mut handle = self.active.remove(&task_id)?;
        handle.finish();
        Some(handle)
    }

    /// Number of running workers.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Whether no worker is running.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Largest active set seen so far.
    pub fn peak(&self) -> usize {
        self.peak
    }

    /// The configured limit.
    pub fn limit(&self) -> ConcurrencyLimit {
        self.limit
    }

    /// Ids of running workers, in launch order.
    pub fn active_ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.active.keys().copied()
    }
}
