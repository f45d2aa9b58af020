//! Peripheral drivers.

#[cfg(target_os = "espidf")]
pub mod pulse_input;
pub mod ultrasonic;
pub mod valve;
pub mod watchdog;
