//! Sensor subsystem: flow metering and presence detection.
//!
//! Both modules are pure logic over port traits.  The hardware that feeds
//! them (pulse input task, ultrasonic driver) lives in [`crate::drivers`].

pub mod flow;
pub mod presence;

use flow::PulseCounter;

/// Pulse tally fed by the flow-sensor input task.
/// `static` because the pulse source outlives every borrow the control
/// loop could hand it.
pub static FLOW_PULSES: PulseCounter = PulseCounter::new();
