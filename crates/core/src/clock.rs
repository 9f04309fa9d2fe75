// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for testable time handling.
//!
//! The engine reasons about wall-clock time at minute resolution. Every
//! timestamp it sees comes from a [`Clock`] so that tests can drive the
//! whole scheduler in virtual time.

use chrono::{Duration, NaiveDateTime, Timelike};
use parking_lot::Mutex;
use std::sync::Arc;

/// A clock that provides the current wall-clock time.
pub trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> NaiveDateTime;
}

/// Real system clock (local time).
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// Controllable clock for testing.
#[derive(Clone)]
pub struct VirtualClock {
    current: Arc<Mutex<NaiveDateTime>>,
}

impl VirtualClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self { current: Arc::new(Mutex::new(start)) }
    }

    /// Advance the clock by the given duration.
    pub fn advance(&self, duration: Duration) {
        let mut current = self.current.lock();
        *current = *current + duration;
    }

    /// Move the clock to a specific instant. Never moves backwards.
    pub fn set(&self, instant: NaiveDateTime) {
        let mut current = self.current.lock();
        if instant > *current {
            *current = instant;
        }
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> NaiveDateTime {
        *self.current.lock()
    }
}

/// Truncate an instant to its minute boundary.
pub fn minute_floor(t: NaiveDateTime) -> NaiveDateTime {
    t - Duration::seconds(i64::from(t.time().second()))
        - Duration::nanoseconds(i64::from(t.time().nanosecond()))
}

/// The first minute boundary strictly after `t`.
pub fn next_minute(t: NaiveDateTime) -> NaiveDateTime {
    minute_floor(t) + Duration::minutes(1)
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
