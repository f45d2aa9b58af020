//! System configuration parameters
//!
//! Every policy constant for the tap lives here.  The defaults are the
//! reference dispensing policy; there is no runtime surface that changes
//! them, the struct exists so tests can exercise other timings and so the
//! boot log can dump the active policy.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which accumulation the end-of-session total reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeScope {
    /// Volume dispensed during the session that just ended.
    Session,
    /// Volume dispensed since power-on.
    Lifetime,
}

/// Core tap configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapConfig {
    // --- Presence gate ---
    /// Maximum hand distance (cm) that counts as "present"
    pub presence_threshold_cm: f32,
    /// Total presence wait budget after a grant (seconds)
    pub presence_wait_secs: u32,
    /// Interval between distance probes (seconds)
    pub presence_poll_secs: u32,
    /// Echo wait limit for one ultrasonic measurement (microseconds)
    pub echo_timeout_us: u32,

    // --- Dispensing ---
    /// Valve-open duration for one session (seconds)
    pub session_duration_secs: u32,
    /// Dispensing loop tick (milliseconds)
    pub dispense_tick_ms: u32,
    /// Flow sampling window (milliseconds)
    pub flow_window_ms: u32,
    /// Flow sensor constant: pulse frequency (Hz) per L/min
    pub calibration_factor: f32,
    /// What the end-of-session total reports
    pub volume_scope: VolumeScope,

    // --- User feedback ---
    /// How long enrolled/granted/denied notices stay on screen (ms)
    pub notice_ms: u32,
    /// How long the final total stays on screen (ms)
    pub total_display_ms: u32,

    // --- Timing ---
    /// Idle credential-poll interval of the main loop (ms)
    pub scan_interval_ms: u32,
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            // Presence
            presence_threshold_cm: 5.0,
            presence_wait_secs: 10,
            presence_poll_secs: 1,
            echo_timeout_us: 30_000, // ~5 m round trip

            // Dispensing
            session_duration_secs: 5,
            dispense_tick_ms: 1000,
            flow_window_ms: 1000,
            calibration_factor: 90.0,
            volume_scope: VolumeScope::Session,

            // Feedback
            notice_ms: 2000,
            total_display_ms: 5000,

            // Timing
            scan_interval_ms: 50,
        }
    }
}

impl TapConfig {
    /// Session duration in milliseconds.
    pub fn session_duration_ms(&self) -> u64 {
        u64::from(self.session_duration_secs) * 1000
    }

    /// Reject values that would break the dispensing invariants.
    pub fn validate(&self) -> Result<()> {
        if !(self.calibration_factor.is_finite() && self.calibration_factor > 0.0) {
            return Err(Error::Config("calibration_factor must be positive"));
        }
        if !(self.presence_threshold_cm.is_finite() && self.presence_threshold_cm >= 0.0) {
            return Err(Error::Config("presence_threshold_cm must be non-negative"));
        }
        if self.presence_poll_secs == 0 {
            return Err(Error::Config("presence_poll_secs must be non-zero"));
        }
        if self.presence_wait_secs < self.presence_poll_secs {
            return Err(Error::Config("presence_wait_secs shorter than one poll"));
        }
        if self.session_duration_secs == 0 {
            return Err(Error::Config("session_duration_secs must be non-zero"));
        }
        if self.dispense_tick_ms == 0 || self.flow_window_ms == 0 {
            return Err(Error::Config("dispense tick and flow window must be non-zero"));
        }
        if self.echo_timeout_us == 0 {
            return Err(Error::Config("echo_timeout_us must be non-zero"));
        }
        Ok(())
    }
}
