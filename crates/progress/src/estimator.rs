//! Remaining-time estimation.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Unit an estimate is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeUnit {
    /// Seconds
    Seconds,
    /// Minutes
    Minutes,
    /// Hours
    Hours,
}

impl TimeUnit {
    /// Label used in progress lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Seconds => "sec",
            TimeUnit::Minutes => "min",
            TimeUnit::Hours => "hours",
        }
    }
}

impl std::fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An estimated time remaining, scaled to a readable unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Eta {
    /// Amount of `unit` left
    pub value: f64,
    /// Unit of `value`
    pub unit: TimeUnit,
}

impl Eta {
    /// Scale a number of seconds: seconds below one minute, minutes below one
    /// hour, hours otherwise.
    pub fn from_seconds(remaining: f64) -> Self {
        if remaining < 60.0 {
            return Self {
                value: remaining,
                unit: TimeUnit::Seconds,
            };
        }

        let minutes = remaining / 60.0;
        if minutes < 60.0 {
            return Self {
                value: minutes,
                unit: TimeUnit::Minutes,
            };
        }

        Self {
            value: minutes / 60.0,
            unit: TimeUnit::Hours,
        }
    }
}

impl std::fmt::Display for Eta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} {}", self.value, self.unit)
    }
}

/// A point-in-time view of a run's progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSample {
    /// Tasks finished so far
    pub completed: usize,
    /// Tasks in the run
    pub total: usize,
    /// Time since the run started
    pub elapsed: Duration,
}

impl ProgressSample {
    /// Create a sample.
    pub fn new(completed: usize, total: usize, elapsed: Duration) -> Self {
        Self {
            completed,
            total,
            elapsed,
        }
    }

    /// Integer percentage of finished tasks.
    pub fn percent(&self) -> usize {
        if self.total == 0 {
            return 0;
        }
        self.completed * 100 / self.total
    }

    /// Remaining seconds extrapolated from the observed throughput.
    ///
    /// `None` until at least one task has completed.
    pub fn remaining_seconds(&self) -> Option<f64> {
        if self.completed == 0 {
            return None;
        }
        let elapsed = self.elapsed.as_secs_f64();
        let estimated_total = self.total as f64 * elapsed / self.completed as f64;
        Some((estimated_total - elapsed).max(0.0))
    }

    /// Remaining time scaled to a readable unit.
    pub fn eta(&self) -> Option<Eta> {
        self.remaining_seconds().map(Eta::from_seconds)
    }
}
