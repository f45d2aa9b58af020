//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(state) => {
                info!("START | initial_state={:?}", state);
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::CredentialEnrolled(c) => {
                info!("ACCESS | enrolled uid={}", c);
            }
            AppEvent::AccessGranted(c) => {
                info!("ACCESS | granted uid={}", c);
            }
            AppEvent::AccessDenied(c) => {
                info!("ACCESS | denied uid={}", c);
            }
            AppEvent::PresenceConfirmed { waited_ms } => {
                info!("PRESENCE | confirmed after {} ms", waited_ms);
            }
            AppEvent::PresenceTimeout => {
                info!("PRESENCE | timeout");
            }
            AppEvent::FlowSample {
                rate_lps,
                total_liters,
            } => {
                info!(
                    "FLOW | rate={:.0}mL/s | total={:.0}mL",
                    rate_lps * 1000.0,
                    total_liters * 1000.0
                );
            }
            AppEvent::SessionCompleted {
                liters,
                lifetime_liters,
                duration_ms,
            } => {
                info!(
                    "SESSION | {:.0}mL in {} ms | lifetime={:.3}L",
                    liters * 1000.0,
                    duration_ms,
                    lifetime_liters
                );
            }
            AppEvent::ReaderFault(e) => {
                warn!("FAULT | reader: {}", e);
            }
            AppEvent::ValveFault { open, error } => {
                warn!("FAULT | valve open={}: {}", open, error);
            }
        }
    }
}
