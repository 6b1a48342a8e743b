//! Application-wide error type for telemon binaries

use thiserror_no_std::Error;

use crate::config::ConfigError;
use crate::network::DeliveryError;
use crate::payload::PayloadError;
use crate::sensors::SensorError;

/// Anything a binary may want to surface during bring-up. The upload loop
/// itself never fails; it only logs.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(ConfigError),
    #[error("Sensor error: {0}")]
    Sensor(SensorError),
    #[error("Delivery error: {0}")]
    Delivery(DeliveryError),
    #[error("Payload error: {0}")]
    Payload(PayloadError),
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<SensorError> for AppError {
    fn from(value: SensorError) -> Self {
        Self::Sensor(value)
    }
}

impl From<DeliveryError> for AppError {
    fn from(value: DeliveryError) -> Self {
        Self::Delivery(value)
    }
}

impl From<PayloadError> for AppError {
    fn from(value: PayloadError) -> Self {
        Self::Payload(value)
    }
}
