//! Raw ADC counts to physical units.

use super::CalibrationOffset;
use crate::config::{AdcConfig, CurrentConfig, LightConfig};

/// Smallest divider resistance used for the lux formula. Keeps a fully lit
/// (0 V) photoresistor at a finite illuminance.
pub const MIN_LIGHT_RESISTANCE_OHMS: f32 = 1.0;

/// Convert an ADC count to volts. Counts above full scale are clamped, so the
/// result always lies in `[0, reference_voltage]`.
pub fn counts_to_voltage(sample: u16, adc: &AdcConfig) -> f32 {
    if adc.max_count == 0 {
        return 0.0;
    }
    if sample >= adc.max_count {
        return adc.reference_voltage;
    }
    let volts = sample as f32 * (adc.reference_voltage / adc.max_count as f32);
    volts.min(adc.reference_voltage)
}

/// Derives illuminance, current and power from raw samples.
///
/// Holds the calibration offset for the lifetime of the agent; there is no way
/// to change it after construction.
#[derive(Debug, Clone, Copy)]
pub struct UnitConverter {
    adc: AdcConfig,
    light: LightConfig,
    current: CurrentConfig,
    offset: CalibrationOffset,
}

impl UnitConverter {
    pub const fn new(
        adc: AdcConfig,
        light: LightConfig,
        current: CurrentConfig,
        offset: CalibrationOffset,
    ) -> Self {
        Self {
            adc,
            light,
            current,
            offset,
        }
    }

    pub const fn offset(&self) -> CalibrationOffset {
        self.offset
    }

    #[inline]
    pub fn voltage(&self, sample: u16) -> f32 {
        counts_to_voltage(sample, &self.adc)
    }

    pub fn illuminance(&self, sample: u16) -> f32 {
        self.illuminance_from_voltage(self.voltage(sample))
    }

    /// Photoresistor on the low side of a divider against a fixed resistor.
    ///
    /// At or above the reference voltage the photoresistor is effectively
    /// open circuit and the result is 0 lux. At 0 V the resistance is clamped
    /// to [`MIN_LIGHT_RESISTANCE_OHMS`].
    pub fn illuminance_from_voltage(&self, voltage: f32) -> f32 {
        let v_ref = self.adc.reference_voltage;
        if voltage >= v_ref {
            return 0.0;
        }
        let voltage = voltage.max(0.0);

        let resistance = (self.light.divider_resistance_ohms * voltage) / (v_ref - voltage);
        let resistance = resistance.max(MIN_LIGHT_RESISTANCE_OHMS);

        self.light.lux_constant / (resistance / 1000.0)
    }

    pub fn current(&self, sample: u16) -> f32 {
        self.current_from_voltage(self.voltage(sample))
    }

    /// Amperes relative to the calibrated zero point. Anything inside the
    /// noise floor (either direction) is exactly 0.
    pub fn current_from_voltage(&self, voltage: f32) -> f32 {
        let amps = (voltage - self.offset.volts()) / self.current.sensitivity_volts_per_amp;
        let floor = self.current.noise_floor_amps;
        if amps > -floor && amps < floor {
            0.0
        } else {
            amps
        }
    }

    pub fn power(&self, current_amps: f32) -> f32 {
        current_amps * self.current.line_voltage
    }
}
