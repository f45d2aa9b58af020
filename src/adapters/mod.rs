//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to               |
//! |----------------|--------------------|---------------------------|
//! | `hardware`     | CredentialReader   | card reader driver        |
//! |                | DistanceProbe      | ultrasonic probe driver   |
//! |                | ValveActuator      | relay valve driver        |
//! | `log_display`  | DisplaySink        | Serial log output         |
//! | `log_sink`     | EventSink          | Serial log output         |
//! | `rc522`        | CredentialReader   | MFRC522 over SPI          |
//! | `time`         | ClockPort          | ESP32 system timer + TWDT |

pub mod hardware;
pub mod log_display;
pub mod log_sink;
#[cfg(target_os = "espidf")]
pub mod rc522;
pub mod time;
