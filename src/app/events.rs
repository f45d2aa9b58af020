//! Outbound application events and cycle outcomes.
//!
//! The [`TapService`](super::service::TapService) emits [`AppEvent`]s
//! through the [`EventSink`](super::ports::EventSink) port and returns a
//! [`CycleOutcome`] from every scan cycle.

use crate::credential::Credential;
use crate::error::{ActuatorError, ReaderError};
use crate::fsm::StateId;

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The service has started (carries initial state).
    Started(StateId),

    /// The session FSM transitioned between states.
    StateChanged { from: StateId, to: StateId },

    /// First credential seen; it is now the reference.
    CredentialEnrolled(Credential),

    /// Presented credential matched the reference.
    AccessGranted(Credential),

    /// Presented credential did not match.
    AccessDenied(Credential),

    /// A hand was detected within the wait budget.
    PresenceConfirmed { waited_ms: u64 },

    /// The wait budget ran out with nothing in range.
    PresenceTimeout,

    /// One flow sampling window closed during dispensing.
    FlowSample { rate_lps: f32, total_liters: f32 },

    /// The valve closed at the end of a session.
    SessionCompleted {
        liters: f32,
        lifetime_liters: f32,
        duration_ms: u64,
    },

    /// The card reader failed; scanning continues.
    ReaderFault(ReaderError),

    /// The valve could not be driven to the commanded position.
    ValveFault { open: bool, error: ActuatorError },
}

/// What one call to [`TapService::run_cycle`](super::service::TapService::run_cycle) did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleOutcome {
    /// No card was presented.
    NoCard,
    /// The reader failed this cycle.
    ReaderFault(ReaderError),
    /// The presented card became the reference.
    Enrolled,
    /// The presented card was rejected.
    Denied,
    /// Access granted but no hand arrived in time.
    PresenceTimeout,
    /// A full session ran; `liters` is the reported total.
    Dispensed { liters: f32 },
    /// A hand was confirmed but the valve would not open; no session ran.
    ValveFault,
}

/// Cumulative counters since power-on.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TapStats {
    pub enrollments: u32,
    pub grants: u32,
    pub denials: u32,
    pub presence_timeouts: u32,
    pub sessions_completed: u32,
    pub reader_faults: u32,
    /// Sessions abandoned because the valve would not open.
    pub valve_faults: u32,
    pub lifetime_liters: f32,
}
