//! TapGate Firmware: Main Entry Point
//!
//! Hexagonal architecture: one cooperative control task plus a pulse
//! input thread feeding the flow counter.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter          LogDisplay    LogEventSink           │
//! │  (Reader+Probe+Valve)     (DisplaySink) (EventSink)            │
//! │  Esp32TimeAdapter (ClockPort, feeds TWDT)                      │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              TapService (pure logic)                   │    │
//! │  │  CredentialGate · FSM · PresenceGate · FlowMeter       │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  flow-pulse thread ──▶ FLOW_PULSES (critical-section tally)    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use log::{debug, info, warn};

use esp_idf_hal::delay::Ets;
use esp_idf_hal::gpio::{AnyIOPin, AnyInputPin, AnyOutputPin, PinDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::spi::config::Config as SpiConfig;
use esp_idf_hal::spi::{SpiDeviceDriver, SpiDriver, SpiDriverConfig};
use esp_idf_hal::units::Hertz;
use mfrc522::comm::blocking::spi::SpiInterface;

use tapgate::adapters::hardware::HardwareAdapter;
use tapgate::adapters::log_display::LogDisplay;
use tapgate::adapters::log_sink::LogEventSink;
use tapgate::adapters::rc522::Rc522Reader;
use tapgate::adapters::time::{self, Esp32TimeAdapter};
use tapgate::app::events::CycleOutcome;
use tapgate::app::ports::ClockPort;
use tapgate::app::service::TapService;
use tapgate::config::TapConfig;
use tapgate::drivers::pulse_input;
use tapgate::drivers::ultrasonic::UltrasonicProbe;
use tapgate::drivers::valve::ValveDriver;
use tapgate::drivers::watchdog::Watchdog;
use tapgate::pins;
use tapgate::sensors::FLOW_PULSES;
use tapgate::timing::Deadline;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  TapGate v{}                         ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = TapConfig::default();
    config.validate()?;
    match serde_json::to_string(&config) {
        Ok(json) => info!("Config: {}", json),
        Err(e) => warn!("Config dump failed: {}", e),
    }
    let scan_interval_ms = u64::from(config.scan_interval_ms);

    let watchdog = Watchdog::new();
    let peripherals = Peripherals::take()?;

    // ── 3. Valve (closed before anything else runs) ───────────
    let relay = PinDriver::output(unsafe { AnyOutputPin::new(pins::VALVE_RELAY_GPIO) })?;
    let valve = ValveDriver::new(relay)?;

    // ── 4. Presence probe ─────────────────────────────────────
    let trigger = PinDriver::output(unsafe { AnyOutputPin::new(pins::ULTRASONIC_TRIGGER_GPIO) })?;
    let echo = PinDriver::input(unsafe { AnyInputPin::new(pins::ULTRASONIC_ECHO_GPIO) })?;
    let probe = UltrasonicProbe::new(trigger, echo, Ets, time::uptime_us, config.echo_timeout_us);

    // ── 5. Card reader ────────────────────────────────────────
    let mut rc522_rst = PinDriver::output(unsafe { AnyOutputPin::new(pins::RC522_RST_GPIO) })?;
    rc522_rst.set_high()?;

    let spi = SpiDriver::new(
        peripherals.spi2,
        unsafe { AnyOutputPin::new(pins::RC522_SCK_GPIO) },
        unsafe { AnyOutputPin::new(pins::RC522_MOSI_GPIO) },
        Some(unsafe { AnyInputPin::new(pins::RC522_MISO_GPIO) }),
        &SpiDriverConfig::new(),
    )?;
    let spi_dev = SpiDeviceDriver::new(
        spi,
        Some(unsafe { AnyOutputPin::new(pins::RC522_CS_GPIO) }),
        &SpiConfig::new().baudrate(Hertz(pins::RC522_SPI_BAUD_HZ)),
    )?;
    let reader = Rc522Reader::new(SpiInterface::new(spi_dev))?;

    // ── 6. Flow pulse input ───────────────────────────────────
    let _pulse_task =
        pulse_input::spawn(unsafe { AnyIOPin::new(pins::FLOW_PULSE_GPIO) }, &FLOW_PULSES)?;

    // ── 7. Construct adapters + app service ───────────────────
    let mut hw = HardwareAdapter::new(reader, probe, valve);
    let mut display = LogDisplay::new();
    let mut sink = LogEventSink::new();
    let mut clock = Esp32TimeAdapter::with_watchdog(watchdog);

    let mut app = TapService::new(config, &FLOW_PULSES);
    app.start(&mut display, &mut sink);

    info!("System ready. Entering scan loop.");

    // ── 8. Scan loop ──────────────────────────────────────────
    loop {
        let outcome = app.run_cycle(&mut hw, &mut display, &mut clock, &mut sink);
        if outcome != CycleOutcome::NoCard {
            debug!("Cycle: {:?} | stats={:?}", outcome, app.stats());
        }

        let next = Deadline::after(clock.now_ms(), scan_interval_ms);
        clock.wait_until(next);
        clock.feed_watchdog();
    }
}
