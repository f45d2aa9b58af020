//! Water valve driver (relay module on a digital output).
//!
//! The relay is active HIGH: driving the pin high energises the coil and
//! opens the valve.  The driver forces the valve closed at construction,
//! so a reboot mid-session never leaves water running.
//!
//! ## Dual-target design
//!
//! Generic over [`embedded_hal::digital::OutputPin`]: on ESP-IDF this is
//! an `esp_idf_hal` `PinDriver`, on host tests a mock pin.

use embedded_hal::digital::OutputPin;
use log::{info, warn};

use crate::app::ports::ValveActuator;
use crate::error::{ActuatorError, Error};

pub struct ValveDriver<P: OutputPin> {
    pin: P,
    open: bool,
}

impl<P: OutputPin> ValveDriver<P> {
    /// Take ownership of the relay pin and drive it to closed.
    pub fn new(mut pin: P) -> Result<Self, Error> {
        pin.set_low()
            .map_err(|_| Error::Init("valve relay pin"))?;
        info!("Valve: initialised closed");
        Ok(Self { pin, open: false })
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl<P: OutputPin> ValveActuator for ValveDriver<P> {
    fn set_open(&mut self, open: bool) -> Result<(), ActuatorError> {
        let res = if open {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };

        match res {
            Ok(()) => {
                self.open = open;
                Ok(())
            }
            Err(_) => {
                warn!("Valve: relay write failed (open={})", open);
                Err(ActuatorError::GpioWriteFailed)
            }
        }
    }
}
