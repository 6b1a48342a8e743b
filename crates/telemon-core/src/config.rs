//! Agent configuration
//!
//! Everything the agent needs to know about its environment is fixed at build
//! time and collected into a single immutable [`AgentConfig`]. Components take
//! the section they care about at construction instead of reaching for globals.

use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

/// User agent sent with every delivery unless overridden.
pub const DEFAULT_USER_AGENT: &str = "ESP32-SmartHome-Sensor";

#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
#[serde(bound(deserialize = "'de: 'a"))]
pub struct AgentConfig<'a> {
    pub network: NetworkConfig<'a>,
    pub collector: CollectorConfig<'a>,
    pub pins: PinConfig,
    pub adc: AdcConfig,
    pub light: LightConfig,
    pub current: CurrentConfig,
    pub calibration: CalibrationConfig,
    pub connectivity: ConnectivityConfig,
    pub schedule: ScheduleConfig,
}

impl<'a> AgentConfig<'a> {
    /// Build a configuration for the given network and collector, with every
    /// other section at its default.
    pub fn new(network: NetworkConfig<'a>, collector: CollectorConfig<'a>) -> Self {
        Self {
            network,
            collector,
            pins: PinConfig::default(),
            adc: AdcConfig::default(),
            light: LightConfig::default(),
            current: CurrentConfig::default(),
            calibration: CalibrationConfig::default(),
            connectivity: ConnectivityConfig::default(),
            schedule: ScheduleConfig::default(),
        }
    }
}

/// Access point credentials.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy)]
pub struct NetworkConfig<'a> {
    pub ssid: &'a str,
    pub password: &'a str,
}

/// Where readings are posted and how the device identifies itself.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct CollectorConfig<'a> {
    pub url: &'a str,
    pub user_agent: &'a str,
}

impl<'a> CollectorConfig<'a> {
    pub const fn new(url: &'a str) -> Self {
        Self {
            url,
            user_agent: DEFAULT_USER_AGENT,
        }
    }
}

/// Sensor wiring: ADC channels for the analog sensors, GPIO for the climate sensor.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinConfig {
    pub light_channel: u8,
    pub climate_pin: u8,
    pub current_channel: u8,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            light_channel: 0,
            climate_pin: 1,
            current_channel: 2,
        }
    }
}

/// ADC reference voltage and full-scale count.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct AdcConfig {
    pub reference_voltage: f32,
    pub max_count: u16,
}

impl Default for AdcConfig {
    fn default() -> Self {
        Self {
            reference_voltage: 3.3,
            max_count: 4095,
        }
    }
}

/// Photoresistor divider constants.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct LightConfig {
    /// Fixed resistor on the other side of the divider
    pub divider_resistance_ohms: f32,
    /// `lux = lux_constant / (resistance / 1000)`
    pub lux_constant: f32,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            divider_resistance_ohms: 10_000.0,
            lux_constant: 500.0,
        }
    }
}

/// Hall-effect current sensor constants (ACS712-20A by default).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct CurrentConfig {
    pub sensitivity_volts_per_amp: f32,
    /// Currents with a smaller magnitude read as exactly zero
    pub noise_floor_amps: f32,
    /// Nominal mains voltage used to derive power
    pub line_voltage: f32,
}

impl Default for CurrentConfig {
    fn default() -> Self {
        Self {
            sensitivity_volts_per_amp: 0.066,
            noise_floor_amps: 0.02,
            line_voltage: 220.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationConfig {
    pub sample_count: u16,
    pub sample_interval_ms: u32,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            sample_count: 100,
            sample_interval_ms: 10,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectivityConfig {
    /// Link status polls per `connect()` before giving up
    pub max_attempts: u32,
    pub poll_interval_ms: u32,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            poll_interval_ms: 1000,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub upload_interval_ms: u64,
    /// Sleep between timer checks of the upload loop
    pub idle_poll_ms: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            upload_interval_ms: 5000,
            idle_poll_ms: 100,
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("collector URL is malformed")]
    InvalidUrl,
    #[error("only plain http:// collector URLs are supported")]
    UnsupportedScheme,
    #[error("collector URL has an invalid port")]
    InvalidPort,
}
