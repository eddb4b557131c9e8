// crates/garage-door-core/src/runtime/clock.rs
// ============================================================================
// Module: Clocks
// Description: System and manual implementations of the clock interface.
// Purpose: Let the monitor loop run against real time or a test-driven clock.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! [`SystemClock`] reads local wall-clock time and sleeps the thread.
//! [`ManualClock`] only moves when told to; `sleep` advances it instantly and
//! records the requested duration.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;

use crate::core::Timestamp;
use crate::interfaces::Clock;

/// Wall-clock time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now_local()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Mutable state behind a [`ManualClock`].
#[derive(Debug)]
struct ManualClockState {
    /// Current time.
    now: Timestamp,
    /// Every duration passed to `sleep`, in order.
    sleeps: Vec<Duration>,
}

/// Deterministic clock for tests; clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    /// Shared clock state.
    state: Arc<Mutex<ManualClockState>>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    #[must_use]
    pub fn new(start: Timestamp) -> Self {
        Self {
            state: Arc::new(Mutex::new(ManualClockState {
                now: start,
                sleeps: Vec::new(),
            })),
        }
    }

    /// Moves the clock forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        guard.now = guard.now.checked_add(duration).unwrap_or(guard.now);
    }

    /// Jumps the clock to `now`.
    pub fn set(&self, now: Timestamp) {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).now = now;
    }

    /// Returns every duration slept so far.
    #[must_use]
    pub fn sleeps(&self) -> Vec<Duration> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).sleeps.clone()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).now
    }

    fn sleep(&self, duration: Duration) {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        guard.now = guard.now.checked_add(duration).unwrap_or(guard.now);
        guard.sleeps.push(duration);
    }
}
