//! TapGate firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod credential;
pub mod display;
pub mod error;
pub mod fsm;
pub mod sensors;
pub mod timing;

pub mod adapters;
pub mod drivers;
pub mod pins;

#[cfg(target_os = "espidf")]
mod esp_link_shims;
