//! Sensor acquisition and derivation
//!
//! The raw hardware sits behind [`SensorSource`]. Everything above it is pure
//! arithmetic ([`conversion`]), a one-shot baseline ([`calibration`]) and the
//! per-cycle snapshot ([`reading`]).

pub mod calibration;
pub mod conversion;
pub mod reading;

pub use calibration::{CalibrationOffset, calibrate};
pub use conversion::UnitConverter;
pub use reading::{Reading, ReadingAssembler, SENTINEL};

use thiserror_no_std::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    #[error("{sensor}: {operation} failed")]
    ReadFailed {
        sensor: &'static str,
        operation: &'static str,
    },
    #[error("{sensor}: reading failed validation")]
    InvalidData { sensor: &'static str },
    #[error("{sensor}: timed out waiting for a response")]
    Timeout { sensor: &'static str },
}

/// One transaction with the temperature/humidity sensor.
///
/// Either field may be NaN when the device reports garbage; the assembler
/// treats that the same as a failed read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateSample {
    pub temperature_celsius: f32,
    pub humidity_percent: f32,
}

/// Raw access to the board's sensors.
pub trait SensorSource {
    /// Sample an ADC channel. The count lies in `[0, AdcConfig::max_count]`.
    fn read_analog(&mut self, channel: u8) -> impl Future<Output = u16>;

    /// Read the logic level of a GPIO.
    fn read_digital(&mut self, pin: u8) -> impl Future<Output = bool>;

    /// Read temperature and humidity in a single sensor transaction.
    fn read_climate(&mut self) -> impl Future<Output = Result<ClimateSample, SensorError>>;
}

impl<T: SensorSource + ?Sized> SensorSource for &mut T {
    #[inline]
    async fn read_analog(&mut self, channel: u8) -> u16 {
        T::read_analog(self, channel).await
    }

    #[inline]
    async fn read_digital(&mut self, pin: u8) -> bool {
        T::read_digital(self, pin).await
    }

    #[inline]
    async fn read_climate(&mut self) -> Result<ClimateSample, SensorError> {
        T::read_climate(self).await
    }
}
