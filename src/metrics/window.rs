//! Analysis time windows.

use crate::error::{Result, TrackError};
use crate::task::Task;
use crate::trajectory::MS_PER_MINUTE;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A `[start, end]` interval of session time in minutes.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimeWindow {
    /// Window start in minutes.
    pub start_minutes: f64,
    /// Window end in minutes; may be infinite.
    pub end_minutes: f64,
}

impl TimeWindow {
    /// Create a window.
    #[must_use]
    pub const fn new(start_minutes: f64, end_minutes: f64) -> Self {
        Self {
            start_minutes,
            end_minutes,
        }
    }

    /// Window covering the default session length of `task`.
    #[must_use]
    pub const fn for_task(task: Task) -> Self {
        Self::new(0.0, task.default_session_minutes())
    }

    /// Window covering any session.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self::new(0.0, f64::INFINITY)
    }

    /// Window start in milliseconds.
    #[inline]
    #[must_use]
    pub fn start_ms(&self) -> f64 {
        self.start_minutes * MS_PER_MINUTE
    }

    /// Window end in milliseconds.
    #[inline]
    #[must_use]
    pub fn end_ms(&self) -> f64 {
        self.end_minutes * MS_PER_MINUTE
    }

    /// Window length in milliseconds.
    #[inline]
    #[must_use]
    pub fn length_ms(&self) -> f64 {
        self.end_ms() - self.start_ms()
    }

    /// Returns `true` if `timestamp_ms` lies in `[start, end]`.
    #[inline]
    #[must_use]
    pub fn contains_ms(&self, timestamp_ms: f64) -> bool {
        self.start_ms() <= timestamp_ms && timestamp_ms <= self.end_ms()
    }

    /// Check that the window is non-negative and not reversed.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::InvalidInput`] otherwise.
    pub fn validate(&self) -> Result<()> {
        if self.start_minutes.is_nan() || self.start_minutes < 0.0 || self.end_minutes < 0.0 {
            return Err(TrackError::invalid_input("time window must not be negative"));
        }
        if self.start_minutes >= self.end_minutes {
            return Err(TrackError::invalid_input(format!(
                "time window start ({}) must precede its end ({})",
                self.start_minutes, self.end_minutes
            )));
        }
        Ok(())
    }
}
