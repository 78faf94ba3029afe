//! Time management for the control loop
//!
//! Everything periodic in the core is gated by comparing a monotonic
//! millisecond counter against a deadline. This module provides:
//! - the `Timestamp` type (milliseconds since boot)
//! - a `TimeSource` abstraction over the board's tick counter
//! - `SoftTimer`, the deadline comparison used by the scheduler

/// Timestamp in milliseconds since device boot
pub type Timestamp = u64;

/// Source of time for the system
pub trait TimeSource {
    /// Get current timestamp in milliseconds
    fn now(&self) -> Timestamp;
}

/// Monotonic time source driven by a tick counter
///
/// Starts at 0 on boot. The board's SysTick or timer interrupt calls
/// `advance` and the control loop reads `now`.
#[derive(Debug, Clone, Default)]
pub struct MonotonicTime {
    elapsed_ms: Timestamp,
}

impl MonotonicTime {
    pub const fn new() -> Self {
        Self { elapsed_ms: 0 }
    }

    /// Account for `ms` milliseconds of elapsed time
    pub fn advance(&mut self, ms: u64) {
        self.elapsed_ms = self.elapsed_ms.saturating_add(ms);
    }
}

impl TimeSource for MonotonicTime {
    fn now(&self) -> Timestamp {
        self.elapsed_ms
    }
}

/// Milliseconds between two timestamps, zero if `later` is before `earlier`
#[inline]
pub fn elapsed_ms(earlier: Timestamp, later: Timestamp) -> u64 {
    later.saturating_sub(earlier)
}

/// Periodic software timer
///
/// Fires on the first check and then whenever at least `period_ms` has
/// passed since the last time it fired. Late checks do not accumulate
/// debt: the next deadline is measured from the check that fired.
#[derive(Debug, Clone, Copy)]
pub struct SoftTimer {
    period_ms: u64,
    last_fired: Option<Timestamp>,
}

impl SoftTimer {
    pub const fn new(period_ms: u64) -> Self {
        Self { period_ms, last_fired: None }
    }

    /// Returns true (and re-arms) when the period has elapsed
    pub fn fire(&mut self, now: Timestamp) -> bool {
        let due = match self.last_fired {
            None => true,
            Some(last) => elapsed_ms(last, now) >= self.period_ms,
        };
        if due {
            self.last_fired = Some(now);
        }
        due
    }

    /// Forget the last firing so the next check fires immediately
    pub fn reset(&mut self) {
        self.last_fired = None;
    }

    pub fn period_ms(&self) -> u64 {
        self.period_ms
    }
}
