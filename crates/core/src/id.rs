//! Identifiers for dispatch runs and the tasks inside them.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Position of a task in the input sequence of its run.
///
/// Task ids are handed out in input order, so comparing ids compares launch
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(usize);

impl TaskId {
    /// Create an id for the task at `index` in the input sequence.
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Zero-based input position.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Unique identifier for a dispatch run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Ulid);

impl RunId {
    /// Generate a new RunId
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for RunId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}
