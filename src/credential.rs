//! Credential enrollment and verification.
//!
//! The gate trusts the first credential it ever sees.  From then on it
//! only answers whether a presented credential is byte-identical to that
//! reference.  There is no re-enrollment path short of a power cycle,
//! and the reference lives in RAM only.
//!
//! ```text
//!   UNSET ──[observe(t)]──▶ VERIFYING{reference = t}
//!                               │
//!                    [observe(t')] t' == reference → Granted
//!                                  t' != reference → Denied
//! ```

use core::fmt;

use log::info;

use crate::error::ReaderError;

/// UID length accepted by the gate (single-size MIFARE UID).
pub const CREDENTIAL_LEN: usize = 4;

/// A fixed-length card UID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Credential([u8; CREDENTIAL_LEN]);

impl Credential {
    pub const fn new(bytes: [u8; CREDENTIAL_LEN]) -> Self {
        Self(bytes)
    }

    /// Validate a raw UID as read from the card.
    ///
    /// Anything other than exactly [`CREDENTIAL_LEN`] bytes is rejected
    /// here, before it can reach the gate.
    pub fn from_uid(uid: &[u8]) -> Result<Self, ReaderError> {
        let bytes: [u8; CREDENTIAL_LEN] = uid
            .try_into()
            .map_err(|_| ReaderError::MalformedUid {
                len: uid.len().min(u8::MAX as usize) as u8,
            })?;
        Ok(Self(bytes))
    }

    pub const fn as_bytes(&self) -> &[u8; CREDENTIAL_LEN] {
        &self.0
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{b:02X}")?;
        }
        Ok(())
    }
}

/// Result of presenting a credential to the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// No reference existed; this credential is now the reference.
    Learned,
    /// Credential matches the reference.
    Granted,
    /// Credential differs from the reference.
    Denied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateState {
    Unset,
    Verifying { reference: Credential },
}

/// One-reference credential gate.
#[derive(Debug)]
pub struct CredentialGate {
    state: GateState,
}

impl Default for CredentialGate {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialGate {
    pub const fn new() -> Self {
        Self {
            state: GateState::Unset,
        }
    }

    /// Present a credential.
    pub fn observe(&mut self, token: Credential) -> Verdict {
        match self.state {
            GateState::Unset => {
                self.state = GateState::Verifying { reference: token };
                info!("CredentialGate: enrolled reference {}", token);
                Verdict::Learned
            }
            GateState::Verifying { reference } if reference == token => Verdict::Granted,
            GateState::Verifying { .. } => Verdict::Denied,
        }
    }

    /// True once a reference credential has been learned.
    pub fn is_enrolled(&self) -> bool {
        matches!(self.state, GateState::Verifying { .. })
    }

    /// The learned reference, if any.
    pub fn reference(&self) -> Option<&Credential> {
        match &self.state {
            GateState::Unset => None,
            GateState::Verifying { reference } => Some(reference),
        }
    }
}
