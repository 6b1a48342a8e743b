//! ESP32-C3 firmware-specific modules for telemon
//!
//! Concrete implementations of the `telemon-core` capability traits: ADC and
//! DHT11 sensor access, the Wi-Fi station link, the HTTP collector channel
//! over embassy-net TCP and DNS, and the embassy time source.

#![no_std]

extern crate alloc;

pub mod board;
pub mod clock;
pub mod delivery;
pub mod dht11;
pub mod wifi;

/// Site configuration baked in by `build.rs`.
pub mod site {
    pub const SSID: &str = env!("TELEMON_SSID");
    pub const PASSWORD: &str = env!("TELEMON_PASSWORD");
    pub const COLLECTOR_URL: &str = env!("TELEMON_COLLECTOR_URL");
}
