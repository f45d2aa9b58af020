//! GPIO / peripheral pin assignments for the TapGate board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Water valve (relay module, active HIGH)
// ---------------------------------------------------------------------------

/// Digital output: HIGH energises the relay and opens the valve.
pub const VALVE_RELAY_GPIO: i32 = 5;

// ---------------------------------------------------------------------------
// Presence probe (HC-SR04 ultrasonic)
// ---------------------------------------------------------------------------

/// Digital output: 10 µs HIGH pulse starts a measurement.
pub const ULTRASONIC_TRIGGER_GPIO: i32 = 7;
/// Digital input: HIGH for the round-trip time of the echo.
pub const ULTRASONIC_ECHO_GPIO: i32 = 6;

// ---------------------------------------------------------------------------
// Flow sensor (YF-S201 hall-effect, open collector)
// ---------------------------------------------------------------------------

/// Digital input with pull-up; one falling edge per pulse.
pub const FLOW_PULSE_GPIO: i32 = 2;

// ---------------------------------------------------------------------------
// RFID reader (MFRC522 on SPI2)
// ---------------------------------------------------------------------------

pub const RC522_SCK_GPIO: i32 = 12;
pub const RC522_MOSI_GPIO: i32 = 11;
pub const RC522_MISO_GPIO: i32 = 13;
pub const RC522_CS_GPIO: i32 = 10;
/// Reader hard reset, active LOW.  Held HIGH during operation.
pub const RC522_RST_GPIO: i32 = 9;

/// SPI clock for the reader (the MFRC522 tops out at 10 MHz).
pub const RC522_SPI_BAUD_HZ: u32 = 1_000_000;

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

/// Width of the ultrasonic trigger pulse.
pub const ULTRASONIC_TRIGGER_US: u32 = 10;
