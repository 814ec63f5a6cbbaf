// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for record timestamps

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Microseconds since the Unix epoch
pub type Micros = u64;

/// A clock that provides the current wall time in epoch microseconds
pub trait Clock: Send + Sync {
    fn now_us(&self) -> Micros;
}

/// Real system clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_us(&self) -> Micros {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or(0)
    }
}

/// Fake clock for testing with controllable time
#[derive(Clone, Debug)]
pub struct FakeClock {
    current: Arc<AtomicU64>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self::starting_at(1_000_000)
    }

    pub fn starting_at(us: Micros) -> Self {
        Self {
            current: Arc::new(AtomicU64::new(us)),
        }
    }

    /// Advance the clock by the given duration
    pub fn advance(&self, duration: Duration) {
        self.current
            .fetch_add(duration.as_micros() as u64, Ordering::SeqCst);
    }

    /// Set the clock to a specific epoch time
    pub fn set(&self, us: Micros) {
        self.current.store(us, Ordering::SeqCst);
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now_us(&self) -> Micros {
        self.current.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
