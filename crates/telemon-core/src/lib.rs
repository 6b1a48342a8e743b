//! Hardware-independent core library for telemon
//!
//! This crate contains all platform-agnostic logic for the telemon
//! environmental telemetry agent: unit conversion, current-sensor calibration,
//! reading assembly, payload encoding, link management, HTTP delivery to the
//! collector and the upload loop.
//! Hardware is reached only through the capability traits
//! ([`sensors::SensorSource`], [`network::NetworkLink`],
//! [`network::DeliveryChannel`], [`clock::Clock`] and
//! `embedded_hal_async::delay::DelayNs`).
//!
//! It is `#![no_std]` so it compiles on both embedded targets (ESP32-C3) and
//! desktop hosts (for the simulator and tests).

#![cfg_attr(not(test), no_std)]

pub mod app_state;
pub mod clock;
pub mod config;
pub mod network;
pub mod payload;
pub mod sensors;
pub mod upload;

#[cfg(test)]
mod testing;

pub use app_state::AppError;
pub use config::AgentConfig;
pub use sensors::Reading;
pub use upload::{CycleOutcome, UploadCycle};
