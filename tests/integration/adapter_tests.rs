//! The production adapter stack (`HardwareAdapter`, `ValveDriver`,
//! `LogDisplay`, `LogEventSink`) driven by `TapService` on host.
//!
//! The relay pin is an `embedded-hal` mock whose level is shared with the
//! fake clock, so water only flows while the pin is actually HIGH.

use std::cell::Cell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, OutputPin};

use tapgate::adapters::hardware::HardwareAdapter;
use tapgate::adapters::log_display::LogDisplay;
use tapgate::adapters::log_sink::LogEventSink;
use tapgate::app::events::CycleOutcome;
use tapgate::app::ports::{CredentialReader, DistanceProbe};
use tapgate::app::service::TapService;
use tapgate::config::TapConfig;
use tapgate::credential::Credential;
use tapgate::display::Screen;
use tapgate::drivers::valve::ValveDriver;
use tapgate::error::ReaderError;
use tapgate::sensors::flow::PulseCounter;

use crate::mock_hw::{CARD_A, ECHO_HAND, FakeClock};

struct RelayPin(Rc<Cell<bool>>);

impl ErrorType for RelayPin {
    type Error = Infallible;
}

impl OutputPin for RelayPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.set(true);
        Ok(())
    }
}

struct ScriptedReader(VecDeque<Credential>);

impl CredentialReader for ScriptedReader {
    fn poll_new_token(&mut self) -> Result<Option<Credential>, ReaderError> {
        Ok(self.0.pop_front())
    }
}

struct HandAlwaysThere;

impl DistanceProbe for HandAlwaysThere {
    fn measure_raw_us(&mut self) -> u32 {
        ECHO_HAND
    }
}

#[test]
fn full_session_through_production_adapters() {
    let level = Rc::new(Cell::new(true));
    let valve = ValveDriver::new(RelayPin(Rc::clone(&level))).unwrap();
    assert!(!level.get(), "valve driver closes the relay at construction");

    let reader = ScriptedReader(VecDeque::from([CARD_A, CARD_A]));
    let mut hw = HardwareAdapter::new(reader, HandAlwaysThere, valve);

    let pulses = PulseCounter::new();
    let mut clock = FakeClock::new(&pulses, Rc::clone(&level), 90);
    let mut display = LogDisplay::new();
    let mut sink = LogEventSink::new();

    let mut app = TapService::new(TapConfig::default(), &pulses);
    app.start(&mut display, &mut sink);
    assert_eq!(display.current(), Some(&Screen::scan_prompt()));

    assert_eq!(
        app.run_cycle(&mut hw, &mut display, &mut clock, &mut sink),
        CycleOutcome::Enrolled
    );

    let outcome = app.run_cycle(&mut hw, &mut display, &mut clock, &mut sink);
    let CycleOutcome::Dispensed { liters } = outcome else {
        panic!("expected a dispense, got {outcome:?}");
    };
    assert!((liters - 5.0 / 60.0).abs() < 1e-4);
    assert!(!level.get(), "relay released after the session");
    assert!(!hw.valve().is_open());
    assert_eq!(display.current(), Some(&Screen::scan_prompt()));

    assert_eq!(
        app.run_cycle(&mut hw, &mut display, &mut clock, &mut sink),
        CycleOutcome::NoCard
    );
}
