//! Flow sensor pulse input (ESP-IDF only).
//!
//! A dedicated thread awaits falling edges on the flow sensor pin and
//! bumps the shared [`PulseCounter`].  The control task never touches the
//! pin; it only drains the tally through
//! [`FlowMeter`](crate::sensors::flow::FlowMeter).

use std::thread::JoinHandle;

use esp_idf_hal::gpio::{AnyIOPin, PinDriver, Pull};
use futures_lite::future::block_on;
use log::{info, warn};

use crate::error::Error;
use crate::sensors::flow::PulseCounter;

const PULSE_TASK_STACK: usize = 4096;

/// Start counting falling edges on `pin` into `counter`.
pub fn spawn(pin: AnyIOPin, counter: &'static PulseCounter) -> Result<JoinHandle<()>, Error> {
    std::thread::Builder::new()
        .name("flow-pulse".into())
        .stack_size(PULSE_TASK_STACK)
        .spawn(move || {
            let mut input = match PinDriver::input(pin) {
                Ok(d) => d,
                Err(e) => {
                    warn!("Flow pulse: pin init failed: {}", e);
                    return;
                }
            };
            if let Err(e) = input.set_pull(Pull::Up) {
                warn!("Flow pulse: pull-up failed: {}", e);
            }
            info!("Flow pulse: counting falling edges");

            block_on(async {
                loop {
                    match input.wait_for_falling_edge().await {
                        Ok(()) => counter.increment(),
                        Err(e) => {
                            warn!("Flow pulse: edge wait failed: {}", e);
                            break;
                        }
                    }
                }
            });
        })
        .map_err(|_| Error::Init("flow pulse task"))
}
