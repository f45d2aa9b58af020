//! Hall-effect water flow sensor: pulse counter and flow meter.
//!
//! The sensor emits one pulse per small, fixed volume of water.  The
//! input task (or ISR) calls [`PulseCounter::increment`] on every falling
//! edge; the control loop drains the tally once per sampling window and
//! converts it to a rate and a running volume.
//!
//! ## Drain contract
//!
//! `drain()` reads and zeroes the tally inside a critical section, which
//! holds off the event source for the read+reset.  An edge that arrives
//! while the section is held is counted after it ends, so it lands in
//! exactly one window: never lost, never counted twice.

use core::cell::Cell;

use critical_section::Mutex;
use log::debug;

use crate::config::{TapConfig, VolumeScope};

/// Tally shared between the pulse source and the control loop.
pub struct PulseCounter {
    count: Mutex<Cell<u32>>,
}

impl Default for PulseCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl PulseCounter {
    pub const fn new() -> Self {
        Self {
            count: Mutex::new(Cell::new(0)),
        }
    }

    /// Count one pulse.  Safe to call from the event source at any time.
    pub fn increment(&self) {
        critical_section::with(|cs| {
            let c = self.count.borrow(cs);
            c.set(c.get().saturating_add(1));
        });
    }

    /// Take every pulse counted so far and reset the tally to zero.
    pub fn drain(&self) -> u32 {
        critical_section::with(|cs| self.count.borrow(cs).replace(0))
    }

    /// Current tally without resetting it (diagnostics only).
    pub fn peek(&self) -> u32 {
        critical_section::with(|cs| self.count.borrow(cs).get())
    }
}

/// Result of one completed sampling window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowState {
    /// Volume accumulated in the current scope (L).
    pub total_volume_liters: f32,
    /// Flow rate over the last window (L/s).
    pub instant_rate_lps: f32,
    /// Uptime at which the current window opened (ms).
    pub window_start_ms: u64,
}

/// Converts windowed pulse counts into rate and volume.
pub struct FlowMeter<'a> {
    pulses: &'a PulseCounter,
    /// Pulse frequency (Hz) per L/min.
    calibration_factor: f32,
    window_ms: u64,
    scope: VolumeScope,
    state: FlowState,
    lifetime_liters: f32,
}

impl<'a> FlowMeter<'a> {
    pub fn new(pulses: &'a PulseCounter, config: &TapConfig) -> Self {
        Self {
            pulses,
            calibration_factor: config.calibration_factor,
            window_ms: u64::from(config.flow_window_ms.max(1)),
            scope: config.volume_scope,
            state: FlowState {
                total_volume_liters: 0.0,
                instant_rate_lps: 0.0,
                window_start_ms: 0,
            },
            lifetime_liters: 0.0,
        }
    }

    /// Re-arm the meter when the valve opens.
    ///
    /// Pulses counted while the valve was closed (drips, sensor noise) are
    /// discarded, the window restarts at `now_ms`, and with
    /// [`VolumeScope::Session`] the reported total restarts at zero.
    pub fn begin_session(&mut self, now_ms: u64) {
        let stray = self.pulses.drain();
        if stray > 0 {
            debug!("FlowMeter: discarded {} stray pulses", stray);
        }
        self.state.window_start_ms = now_ms;
        self.state.instant_rate_lps = 0.0;
        if self.scope == VolumeScope::Session {
            self.state.total_volume_liters = 0.0;
        }
    }

    /// Close the current window if it is due.
    ///
    /// Returns `None` while the window is still open; that is "not yet",
    /// not a failure.
    pub fn sample(&mut self, now_ms: u64) -> Option<FlowState> {
        let elapsed_ms = now_ms.saturating_sub(self.state.window_start_ms);
        if elapsed_ms < self.window_ms {
            return None;
        }

        let pulses = self.pulses.drain();
        let pulses_per_sec = pulses as f32 * 1000.0 / elapsed_ms as f32;
        let rate_l_per_min = pulses_per_sec / self.calibration_factor;
        let window_liters = pulses as f32 / (self.calibration_factor * 60.0);

        self.state.instant_rate_lps = rate_l_per_min / 60.0;
        self.state.total_volume_liters += window_liters;
        self.state.window_start_ms = now_ms;
        self.lifetime_liters += window_liters;

        debug!(
            "FlowMeter: {} pulses / {} ms -> {:.3} L/min, total {:.3} L",
            pulses, elapsed_ms, rate_l_per_min, self.state.total_volume_liters
        );
        Some(self.state)
    }

    /// Volume in the configured reporting scope (L).
    pub fn total_liters(&self) -> f32 {
        self.state.total_volume_liters
    }

    /// Volume since power-on, regardless of scope (L).
    pub fn lifetime_liters(&self) -> f32 {
        self.lifetime_liters
    }
}
