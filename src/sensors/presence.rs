//! Presence gate on top of an HC-SR04 style ultrasonic probe.
//!
//! The probe reports a raw echo pulse width; this module turns it into a
//! distance, decides whether a hand is in range, and runs the bounded
//! polling wait that follows a granted credential.
//!
//! An echo width of zero means the sensor timed out.  That is treated as
//! "nothing there", so a flaky sensor can only ever delay a session, never
//! open the valve.

use log::debug;

use crate::app::ports::{ClockPort, DistanceProbe};
use crate::config::TapConfig;
use crate::timing::Deadline;

/// Round-trip µs per cm at ~20 °C (speed of sound ≈ 343 m/s).
const US_PER_CM: f32 = 29.1;

/// Interpretation of one probe measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProbeReading {
    /// No echo (timeout or sensor dropout).
    Dropout,
    /// Object at this distance (cm).
    Distance(f32),
}

impl ProbeReading {
    /// Convert a raw echo pulse width (µs) to a reading.
    pub fn from_echo_us(raw_us: u32) -> Self {
        if raw_us == 0 {
            Self::Dropout
        } else {
            // Echo covers the distance twice.
            Self::Distance(raw_us as f32 / 2.0 / US_PER_CM)
        }
    }
}

/// Bounded-wait proximity check.
pub struct PresenceGate {
    threshold_cm: f32,
}

impl PresenceGate {
    pub fn new(config: &TapConfig) -> Self {
        Self {
            threshold_cm: config.presence_threshold_cm,
        }
    }

    /// True if the reading places an object within `[0, threshold]`.
    pub fn is_present(&self, reading: ProbeReading) -> bool {
        match reading {
            ProbeReading::Dropout => false,
            ProbeReading::Distance(cm) => (0.0..=self.threshold_cm).contains(&cm),
        }
    }

    /// Take one measurement and classify it.
    pub fn poll(&self, probe: &mut impl DistanceProbe) -> bool {
        let reading = ProbeReading::from_echo_us(probe.measure_raw_us());
        if reading == ProbeReading::Dropout {
            debug!("PresenceGate: no echo");
        }
        self.is_present(reading)
    }

    /// Poll the probe every `poll_interval_secs` for at most
    /// `max_wait_secs`, returning as soon as a hand is detected.
    ///
    /// `on_countdown` receives the remaining budget in seconds before each
    /// wait (10, 9, … 1 for the reference policy).
    pub fn await_presence(
        &self,
        probe: &mut impl DistanceProbe,
        clock: &mut impl ClockPort,
        max_wait_secs: u32,
        poll_interval_secs: u32,
        mut on_countdown: impl FnMut(u32),
    ) -> bool {
        let interval = poll_interval_secs.max(1);
        let polls = max_wait_secs / interval;

        let mut next = clock.now_ms();
        for k in 0..polls {
            on_countdown(max_wait_secs - k * interval);

            let deadline = Deadline::after(next, u64::from(interval) * 1000);
            clock.wait_until(deadline);
            next = deadline.at_ms();

            if self.poll(probe) {
                debug!("PresenceGate: hand detected on poll {}", k + 1);
                return true;
            }
        }
        false
    }
}
