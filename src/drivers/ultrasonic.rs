//! HC-SR04 ultrasonic probe driver.
//!
//! A 10 µs trigger pulse starts a measurement; the sensor then holds the
//! echo line HIGH for the round-trip time of the sound burst.  The driver
//! measures that pulse width against a microsecond time source and
//! reports it raw.  Distance conversion and the presence decision live in
//! [`PresenceGate`](crate::sensors::presence::PresenceGate).
//!
//! Both waits (for the rising edge and for the falling edge) are bounded
//! by `echo_timeout_us`.  A timeout or GPIO failure reports `0`, which the
//! presence gate treats as "nothing there".

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::debug;

use crate::app::ports::DistanceProbe;
use crate::error::SensorError;
use crate::pins;

/// Settle time with the trigger held LOW before the pulse.
const TRIGGER_SETTLE_US: u32 = 2;

pub struct UltrasonicProbe<T, E, D>
where
    T: OutputPin,
    E: InputPin,
    D: DelayNs,
{
    trigger: T,
    echo: E,
    delay: D,
    /// Monotonic microsecond source.
    now_us: fn() -> u64,
    echo_timeout_us: u32,
}

impl<T, E, D> UltrasonicProbe<T, E, D>
where
    T: OutputPin,
    E: InputPin,
    D: DelayNs,
{
    pub fn new(trigger: T, echo: E, delay: D, now_us: fn() -> u64, echo_timeout_us: u32) -> Self {
        Self {
            trigger,
            echo,
            delay,
            now_us,
            echo_timeout_us,
        }
    }

    /// Fire one measurement and return the echo pulse width in µs.
    pub fn measure(&mut self) -> Result<u32, SensorError> {
        self.pulse_trigger()?;

        let timeout = u64::from(self.echo_timeout_us);

        let wait_start = (self.now_us)();
        while !self.echo_high()? {
            if (self.now_us)().saturating_sub(wait_start) > timeout {
                return Err(SensorError::EchoTimeout);
            }
        }

        let rise = (self.now_us)();
        while self.echo_high()? {
            if (self.now_us)().saturating_sub(rise) > timeout {
                return Err(SensorError::EchoTimeout);
            }
        }

        let width = (self.now_us)().saturating_sub(rise);
        Ok(u32::try_from(width).unwrap_or(u32::MAX))
    }

    fn pulse_trigger(&mut self) -> Result<(), SensorError> {
        self.trigger
            .set_low()
            .map_err(|_| SensorError::GpioWriteFailed)?;
        self.delay.delay_us(TRIGGER_SETTLE_US);
        self.trigger
            .set_high()
            .map_err(|_| SensorError::GpioWriteFailed)?;
        self.delay.delay_us(pins::ULTRASONIC_TRIGGER_US);
        self.trigger
            .set_low()
            .map_err(|_| SensorError::GpioWriteFailed)
    }

    fn echo_high(&mut self) -> Result<bool, SensorError> {
        self.echo.is_high().map_err(|_| SensorError::GpioReadFailed)
    }
}

impl<T, E, D> DistanceProbe for UltrasonicProbe<T, E, D>
where
    T: OutputPin,
    E: InputPin,
    D: DelayNs,
{
    fn measure_raw_us(&mut self) -> u32 {
        match self.measure() {
            Ok(us) => us,
            Err(e) => {
                debug!("Ultrasonic: {}", e);
                0
            }
        }
    }
}
