//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ TapService (domain)
//! ```
//!
//! Driven adapters (card reader, ultrasonic probe, relay, display, clock,
//! event sink) implement these traits.  The
//! [`TapService`](super::service::TapService) consumes them via generics,
//! so the domain core never touches hardware directly.

use crate::credential::Credential;
use crate::display::Screen;
use crate::error::{ActuatorError, ReaderError};
use crate::timing::Deadline;

// ───────────────────────────────────────────────────────────────
// Credential reader (driven adapter: card → domain)
// ───────────────────────────────────────────────────────────────

/// Source of freshly presented credentials.
pub trait CredentialReader {
    /// Return the credential of a newly presented card, if any.
    ///
    /// Implementations validate UID length before returning; a UID of the
    /// wrong size is an `Err(ReaderError::MalformedUid)`, never a
    /// `Credential`.
    fn poll_new_token(&mut self) -> Result<Option<Credential>, ReaderError>;
}

// ───────────────────────────────────────────────────────────────
// Distance probe (driven adapter: ultrasonic sensor → domain)
// ───────────────────────────────────────────────────────────────

/// Dumb echo-duration source.  Distance and threshold logic stay in
/// [`PresenceGate`](crate::sensors::presence::PresenceGate).
pub trait DistanceProbe {
    /// Trigger one measurement and return the echo pulse width in µs.
    /// `0` means no echo was received.
    fn measure_raw_us(&mut self) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Valve actuator (driven adapter: domain → relay)
// ───────────────────────────────────────────────────────────────

pub trait ValveActuator {
    /// Open (`true`) or close (`false`) the water valve.
    fn set_open(&mut self, open: bool) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Display sink (driven adapter: domain → LCD / log)
// ───────────────────────────────────────────────────────────────

pub trait DisplaySink {
    /// Replace both lines of the panel.
    fn show(&mut self, screen: &Screen);
}

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: domain ↔ monotonic timer)
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock with blocking deadline waits.
///
/// Test doubles implement `wait_until` by jumping straight to the
/// deadline, which makes every timed behaviour deterministic.
pub trait ClockPort {
    /// Milliseconds since boot.
    fn now_ms(&self) -> u64;

    /// Block until `deadline` has been reached.
    fn wait_until(&mut self, deadline: Deadline);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
