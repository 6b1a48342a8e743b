//! Zero-load baseline for the current sensor.
//!
//! Hall-effect current sensors idle around half their supply rather than at
//! 0 V, and the exact idle point drifts between parts and boards. The agent
//! measures it once at boot and subtracts it from every later sample.
//!
//! The measurement assumes no load current flows while it runs. Nothing here
//! can detect a violation: a load present at boot skews current and power for
//! the rest of the session.

use embedded_hal_async::delay::DelayNs;
use log::{info, warn};

use super::SensorSource;
use super::conversion::counts_to_voltage;
use crate::config::{AdcConfig, CalibrationConfig};

/// Average zero-signal voltage of the current sensor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CalibrationOffset {
    volts: f32,
}

impl CalibrationOffset {
    pub const ZERO: Self = Self { volts: 0.0 };

    pub const fn from_volts(volts: f32) -> Self {
        Self { volts }
    }

    pub const fn volts(self) -> f32 {
        self.volts
    }
}

/// Sample `channel` `sample_count` times, `sample_interval_ms` apart, and
/// return the mean as a voltage.
///
/// Always produces an offset. A zero sample count yields [`CalibrationOffset::ZERO`].
pub async fn calibrate<S, D>(
    sensors: &mut S,
    delay: &mut D,
    channel: u8,
    adc: &AdcConfig,
    config: &CalibrationConfig,
) -> CalibrationOffset
where
    S: SensorSource,
    D: DelayNs,
{
    info!("Calibrating current sensor on channel {}...", channel);

    if config.sample_count == 0 {
        warn!("Calibration sample count is 0, using a 0 V zero point");
        return CalibrationOffset::ZERO;
    }

    let mut sum: u32 = 0;
    for _ in 0..config.sample_count {
        sum += u32::from(sensors.read_analog(channel).await);
        delay.delay_ms(config.sample_interval_ms).await;
    }

    let mean_counts = sum as f32 / f32::from(config.sample_count);
    let volts = mean_counts * (adc.reference_voltage / f32::from(adc.max_count.max(1)));
    // Keep the same clamping as single-sample conversion
    let volts = volts.min(counts_to_voltage(adc.max_count, adc));

    info!("Zero point: {:.3}V", volts);
    CalibrationOffset::from_volts(volts)
}
