//! Monotonic deadlines.
//!
//! Every wait in the control loop (notices, presence polls, dispensing
//! ticks) is expressed as a [`Deadline`] on the millisecond uptime clock
//! and handed to [`ClockPort::wait_until`].  Tests inject a fake clock
//! that jumps straight to the deadline.

use crate::app::ports::ClockPort;

/// A point on the monotonic millisecond clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline {
    at_ms: u64,
}

impl Deadline {
    /// Deadline `ms` after `now_ms`.
    pub const fn after(now_ms: u64, ms: u64) -> Self {
        Self {
            at_ms: now_ms.saturating_add(ms),
        }
    }

    /// Absolute uptime of the deadline (ms).
    pub const fn at_ms(&self) -> u64 {
        self.at_ms
    }

    /// True once `now_ms` has reached the deadline.
    pub const fn is_reached(&self, now_ms: u64) -> bool {
        now_ms >= self.at_ms
    }

    /// Milliseconds left until the deadline (0 once reached).
    pub const fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.at_ms.saturating_sub(now_ms)
    }
}

/// Block for `ms` milliseconds from now.
pub fn wait_ms(clock: &mut impl ClockPort, ms: u64) {
    let deadline = Deadline::after(clock.now_ms(), ms);
    clock.wait_until(deadline);
}
