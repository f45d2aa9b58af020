//! ESP32 time adapter.
//!
//! Provides the monotonic [`ClockPort`] for the TapGate control task.
//!
//! - **`target_os = "espidf"`** wraps `esp_timer_get_time()` from the
//!   ESP-IDF high-resolution timer (microsecond precision, monotonic).
//! - **`not(target_os = "espidf")`** uses `std::time::Instant` for
//!   host-side simulation.
//!
//! Waits sleep in slices of at most [`MAX_SLEEP_SLICE_MS`] and feed the
//! attached [`Watchdog`] between slices, so a 5 s dispensing session or
//! a 10 s presence countdown never starves the TWDT.

use std::time::Duration;

use crate::app::ports::ClockPort;
use crate::drivers::watchdog::Watchdog;
use crate::timing::Deadline;

/// Longest single sleep inside [`ClockPort::wait_until`].
pub const MAX_SLEEP_SLICE_MS: u64 = 1_000;

#[cfg(not(target_os = "espidf"))]
static BOOT: std::sync::OnceLock<std::time::Instant> = std::sync::OnceLock::new();

/// Microseconds since boot (monotonic).
///
/// Free function so it can be handed to drivers as a `fn() -> u64`.
#[cfg(target_os = "espidf")]
pub fn uptime_us() -> u64 {
    (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
}

/// Microseconds since first use (monotonic).
#[cfg(not(target_os = "espidf"))]
pub fn uptime_us() -> u64 {
    BOOT.get_or_init(std::time::Instant::now).elapsed().as_micros() as u64
}

/// Time adapter for the ESP32-S3 platform.
#[derive(Default)]
pub struct Esp32TimeAdapter {
    watchdog: Option<Watchdog>,
}

impl Esp32TimeAdapter {
    pub fn new() -> Self {
        Self { watchdog: None }
    }

    /// Feed `watchdog` while blocked in [`ClockPort::wait_until`].
    pub fn with_watchdog(watchdog: Watchdog) -> Self {
        Self {
            watchdog: Some(watchdog),
        }
    }

    /// Feed the attached watchdog, if any.
    pub fn feed_watchdog(&self) {
        if let Some(wd) = &self.watchdog {
            wd.feed();
        }
    }
}

impl ClockPort for Esp32TimeAdapter {
    fn now_ms(&self) -> u64 {
        uptime_us() / 1_000
    }

    fn wait_until(&mut self, deadline: Deadline) {
        loop {
            let remaining = deadline.remaining_ms(self.now_ms());
            if remaining == 0 {
                break;
            }
            std::thread::sleep(Duration::from_millis(remaining.min(MAX_SLEEP_SLICE_MS)));
            self.feed_watchdog();
        }
    }
}
