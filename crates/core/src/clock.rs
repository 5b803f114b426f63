// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Time sources for queue bookkeeping and result timestamps
//!
//! The queue measures wait and processing times with monotonic instants.
//! Results and progress snapshots carry wall-clock timestamps. Both come
//! from one [`Clock`], so a [`FakeClock`] drives all of them in tests.

use chrono::{DateTime, TimeDelta, Utc};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

pub trait Clock: Clone + Send + Sync {
    /// Monotonic instant for measuring durations
    fn now(&self) -> Instant;

    /// Wall-clock time for outward-facing timestamps
    fn utc_now(&self) -> DateTime<Utc>;

    /// Time elapsed since `earlier`, saturating at zero
    fn since(&self, earlier: Instant) -> Duration {
        self.now().saturating_duration_since(earlier)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock; clones share the same time
#[derive(Clone, Debug)]
pub struct FakeClock {
    time: Arc<Mutex<FakeTime>>,
}

#[derive(Debug)]
struct FakeTime {
    instant: Instant,
    wall: DateTime<Utc>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    /// Clock whose wall time starts at `wall`
    pub fn starting_at(wall: DateTime<Utc>) -> Self {
        Self {
            time: Arc::new(Mutex::new(FakeTime {
                instant: Instant::now(),
                wall,
            })),
        }
    }

    /// Move both time lines forward by `step`
    pub fn advance(&self, step: Duration) {
        let mut time = self.lock();
        time.instant += step;
        time.wall = TimeDelta::from_std(step)
            .ok()
            .and_then(|delta| time.wall.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
    }

    fn lock(&self) -> MutexGuard<'_, FakeTime> {
        self.time.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.lock().instant
    }

    fn utc_now(&self) -> DateTime<Utc> {
        self.lock().wall
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
