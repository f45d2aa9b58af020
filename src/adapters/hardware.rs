//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the card reader, the presence probe and the valve driver, and
//! exposes them through [`CredentialReader`], [`DistanceProbe`] and
//! [`ValveActuator`] as the single `hw` handle the
//! [`TapService`](crate::app::service::TapService) scan cycle expects.
//! It is generic so the same bundle works with ESP-IDF drivers on target
//! and mock peripherals on host.

use crate::app::ports::{CredentialReader, DistanceProbe, ValveActuator};
use crate::credential::Credential;
use crate::error::{ActuatorError, ReaderError};

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<R, P, V> {
    reader: R,
    probe: P,
    valve: V,
}

impl<R, P, V> HardwareAdapter<R, P, V>
where
    R: CredentialReader,
    P: DistanceProbe,
    V: ValveActuator,
{
    pub fn new(reader: R, probe: P, valve: V) -> Self {
        Self {
            reader,
            probe,
            valve,
        }
    }

    pub fn valve(&self) -> &V {
        &self.valve
    }
}

// ── CredentialReader implementation ───────────────────────────

impl<R: CredentialReader, P, V> CredentialReader for HardwareAdapter<R, P, V> {
    fn poll_new_token(&mut self) -> Result<Option<Credential>, ReaderError> {
        self.reader.poll_new_token()
    }
}

// ── DistanceProbe implementation ──────────────────────────────

impl<R, P: DistanceProbe, V> DistanceProbe for HardwareAdapter<R, P, V> {
    fn measure_raw_us(&mut self) -> u32 {
        self.probe.measure_raw_us()
    }
}

// ── ValveActuator implementation ──────────────────────────────

impl<R, P, V: ValveActuator> ValveActuator for HardwareAdapter<R, P, V> {
    fn set_open(&mut self, open: bool) -> Result<(), ActuatorError> {
        self.valve.set_open(open)
    }
}
