//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to: the inputs the service feeds in (verdict, presence result,
//! current time), the valve command the handlers produce, the session
//! record, and the configuration.

use crate::config::TapConfig;
use crate::credential::Verdict;

// ---------------------------------------------------------------------------
// Inputs (written by the service; consumed by state handlers)
// ---------------------------------------------------------------------------

/// One-shot inputs for the next tick.  Handlers `take()` them so a value
/// is acted on at most once.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionInputs {
    /// Verdict of the credential presented this cycle.
    pub verdict: Option<Verdict>,
    /// Outcome of the presence wait.
    pub presence: Option<bool>,
}

// ---------------------------------------------------------------------------
// Actuator commands (written by state handlers; applied by the service)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActuatorCommands {
    /// Desired valve position.
    pub valve_open: bool,
}

// ---------------------------------------------------------------------------
// Session record
// ---------------------------------------------------------------------------

/// The single dispensing session.  `active` is true exactly while the
/// FSM is in `Dispensing`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionState {
    pub active: bool,
    /// Uptime at which the valve was commanded open (ms).
    pub start_ms: u64,
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

pub struct FsmContext {
    /// Uptime of the current tick (ms).
    pub now_ms: u64,

    pub inputs: SessionInputs,
    pub commands: ActuatorCommands,
    pub session: SessionState,
    pub config: TapConfig,
}

impl FsmContext {
    pub fn new(config: TapConfig) -> Self {
        Self {
            now_ms: 0,
            inputs: SessionInputs::default(),
            commands: ActuatorCommands::default(),
            session: SessionState::default(),
            config,
        }
    }

    /// Milliseconds since the valve opened (0 outside a session).
    pub fn session_elapsed_ms(&self) -> u64 {
        if self.session.active {
            self.now_ms.saturating_sub(self.session.start_ms)
        } else {
            0
        }
    }
}
