//! One full sampling pass across every sensor.

use core::fmt;

use log::{debug, warn};

use super::{SensorSource, UnitConverter};
use crate::clock::Clock;
use crate::config::PinConfig;

/// Marks a climate field as unavailable. Never a real measurement.
pub const SENTINEL: f32 = -1.0;

/// Snapshot of every derived quantity from one cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Lux, never negative
    pub illuminance: f32,
    /// °C, or [`SENTINEL`]
    pub temperature: f32,
    /// %RH, or [`SENTINEL`]
    pub humidity: f32,
    /// Amperes, exactly 0 inside the noise floor
    pub current: f32,
    /// Watts at the nominal line voltage
    pub power: f32,
    /// Milliseconds since boot
    pub timestamp: u64,
}

impl Reading {
    /// `false` when the climate sensor failed this cycle.
    pub fn climate_available(&self) -> bool {
        self.temperature != SENTINEL && self.humidity != SENTINEL
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Sensor Readings ===")?;
        writeln!(f, "Light: {:.2} lux", self.illuminance)?;
        if self.climate_available() {
            writeln!(f, "Temp: {:.2} °C", self.temperature)?;
            writeln!(f, "Humidity: {:.2} %", self.humidity)?;
        } else {
            writeln!(f, "Temp: unavailable")?;
            writeln!(f, "Humidity: unavailable")?;
        }
        writeln!(f, "Current: {:.3} A", self.current)?;
        writeln!(f, "Power: {:.2} W", self.power)?;
        write!(f, "=======================")
    }
}

/// Reads every sensor in a fixed order and derives a [`Reading`].
///
/// Never fails as a whole: a failed climate read degrades temperature and
/// humidity to [`SENTINEL`] and leaves the other fields untouched.
pub struct ReadingAssembler<S, C> {
    sensors: S,
    clock: C,
    converter: UnitConverter,
    pins: PinConfig,
}

impl<S, C> ReadingAssembler<S, C>
where
    S: SensorSource,
    C: Clock,
{
    pub const fn new(sensors: S, clock: C, converter: UnitConverter, pins: PinConfig) -> Self {
        Self {
            sensors,
            clock,
            converter,
            pins,
        }
    }

    pub const fn converter(&self) -> &UnitConverter {
        &self.converter
    }

    pub async fn assemble(&mut self) -> Reading {
        let light_raw = self.sensors.read_analog(self.pins.light_channel).await;
        let illuminance = self.converter.illuminance(light_raw);

        let current_raw = self.sensors.read_analog(self.pins.current_channel).await;
        let current = self.converter.current(current_raw);
        let power = self.converter.power(current);

        debug!("Raw light = {}, raw current = {}", light_raw, current_raw);

        // Temperature and humidity come from one transaction, so a bad field
        // invalidates both.
        let (temperature, humidity) = match self.sensors.read_climate().await {
            Ok(sample)
                if sample.temperature_celsius.is_finite() && sample.humidity_percent.is_finite() =>
            {
                (sample.temperature_celsius, sample.humidity_percent)
            }
            Ok(sample) => {
                warn!(
                    "Climate sensor returned non-numeric data (t = {}, h = {})",
                    sample.temperature_celsius, sample.humidity_percent
                );
                (SENTINEL, SENTINEL)
            }
            Err(e) => {
                warn!("Failed to read from climate sensor: {}", e);
                (SENTINEL, SENTINEL)
            }
        };

        Reading {
            illuminance,
            temperature,
            humidity,
            current,
            power,
            timestamp: self.clock.now_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AdcConfig, CurrentConfig, LightConfig};
    use crate::sensors::{CalibrationOffset, ClimateSample, SensorError};
    use crate::testing::{MockClock, ScriptedSensors};
    use embassy_futures::block_on;

    fn converter() -> UnitConverter {
        UnitConverter::new(
            AdcConfig::default(),
            LightConfig::default(),
            CurrentConfig::default(),
            CalibrationOffset::from_volts(1.65),
        )
    }

    fn sensors() -> ScriptedSensors {
        // Light at mid-scale, current ~0.76 A above the zero point
        ScriptedSensors::new().with_analog(0, 2048).with_analog(2, 2110)
    }

    #[test]
    fn test_assemble_derives_every_field() {
        let clock = MockClock::new();
        clock.set_ms(12_345);
        let mut assembler =
            ReadingAssembler::new(sensors(), &clock, converter(), PinConfig::default());

        let reading = block_on(assembler.assemble());

        let c = converter();
        assert_eq!(reading.illuminance, c.illuminance(2048));
        assert_eq!(reading.current, c.current(2110));
        assert!(reading.current > 0.0);
        assert_eq!(reading.power, reading.current * 220.0);
        assert_eq!(reading.temperature, 21.5);
        assert_eq!(reading.humidity, 45.25);
        assert_eq!(reading.timestamp, 12_345);
        assert!(reading.climate_available());
    }

    #[test]
    fn test_sensor_read_order() {
        let clock = MockClock::new();
        let mut sensors = sensors();
        {
            let mut assembler =
                ReadingAssembler::new(&mut sensors, &clock, converter(), PinConfig::default());
            block_on(assembler.assemble());
        }

        assert_eq!(sensors.analog_reads, [0, 2]);
        assert_eq!(sensors.climate_reads, 1);
    }

    #[test]
    fn test_climate_failure_sets_both_sentinels() {
        let clock = MockClock::new();
        let mut sensors = sensors();
        sensors.push_climate(Err(SensorError::Timeout { sensor: "DHT11" }));
        let mut assembler =
            ReadingAssembler::new(sensors, &clock, converter(), PinConfig::default());

        let reading = block_on(assembler.assemble());

        assert_eq!(reading.temperature, SENTINEL);
        assert_eq!(reading.humidity, SENTINEL);
        assert!(!reading.climate_available());

        let c = converter();
        assert_eq!(reading.illuminance, c.illuminance(2048));
        assert_eq!(reading.current, c.current(2110));
    }

    #[test]
    fn test_single_nan_field_invalidates_both() {
        let clock = MockClock::new();
        let mut sensors = sensors();
        sensors.push_climate(Ok(ClimateSample {
            temperature_celsius: 23.0,
            humidity_percent: f32::NAN,
        }));
        sensors.push_climate(Ok(ClimateSample {
            temperature_celsius: f32::NAN,
            humidity_percent: 40.0,
        }));
        let mut assembler =
            ReadingAssembler::new(sensors, &clock, converter(), PinConfig::default());

        for _ in 0..2 {
            let reading = block_on(assembler.assemble());
            assert_eq!(reading.temperature, -1.0);
            assert_eq!(reading.humidity, -1.0);
        }

        // Queue exhausted, next read recovers
        let reading = block_on(assembler.assemble());
        assert!(reading.climate_available());
    }

    #[test]
    fn test_timestamp_taken_after_reads() {
        let clock = MockClock::new();
        clock.set_ms(500);
        let mut assembler =
            ReadingAssembler::new(sensors(), &clock, converter(), PinConfig::default());

        let first = block_on(assembler.assemble());
        clock.advance_ms(5000);
        let second = block_on(assembler.assemble());

        assert_eq!(first.timestamp, 500);
        assert_eq!(second.timestamp, 5500);
    }

    #[test]
    fn test_display_marks_unavailable_climate() {
        let reading = Reading {
            illuminance: 50.0,
            temperature: SENTINEL,
            humidity: SENTINEL,
            current: 0.0,
            power: 0.0,
            timestamp: 1,
        };

        let text = reading.to_string();
        assert!(text.contains("Light: 50.00 lux"));
        assert!(text.contains("Temp: unavailable"));
        assert!(text.contains("Current: 0.000 A"));
    }
}
