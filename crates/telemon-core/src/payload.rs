//! JSON payload for the collector.
//!
//! The collector parses fields by name with a fixed precision, so the encoder
//! writes the object by hand instead of going through a generic serializer:
//!
//! ```text
//! {"light_intensity":50.00,"temperature":21.50,"humidity":45.25,"current":0.758,"power":166.76,"timestamp":5012}
//! ```

use core::fmt::{self, Write};

use thiserror_no_std::Error;

use crate::sensors::Reading;

/// Large enough for six fields at the widest `f32` rendering.
pub const PAYLOAD_CAPACITY: usize = 384;

pub type Payload = heapless::String<PAYLOAD_CAPACITY>;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadError {
    #[error("encoded reading exceeds {0} bytes")]
    Capacity(usize),
}

/// Encode a reading into a fixed-capacity buffer.
pub fn encode(reading: &Reading) -> Result<Payload, PayloadError> {
    let mut payload = Payload::new();
    write_reading(&mut payload, reading).map_err(|_| PayloadError::Capacity(PAYLOAD_CAPACITY))?;
    Ok(payload)
}

/// Write the JSON object for `reading` into any formatter sink.
pub fn write_reading<W: Write>(out: &mut W, reading: &Reading) -> fmt::Result {
    write!(
        out,
        "{{\"light_intensity\":{:.2},\"temperature\":{:.2},\"humidity\":{:.2},\"current\":{:.3},\"power\":{:.2},\"timestamp\":{}}}",
        reading.illuminance,
        reading.temperature,
        reading.humidity,
        reading.current,
        reading.power,
        reading.timestamp,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::SENTINEL;
    use serde_json::Value;

    fn reading() -> Reading {
        Reading {
            illuminance: 123.456,
            temperature: 21.5,
            humidity: 45.25,
            current: 0.7576,
            power: 166.672,
            timestamp: 5012,
        }
    }

    #[test]
    fn test_exact_layout() {
        let payload = encode(&reading()).unwrap();
        assert_eq!(
            payload.as_str(),
            "{\"light_intensity\":123.46,\"temperature\":21.50,\"humidity\":45.25,\"current\":0.758,\"power\":166.67,\"timestamp\":5012}"
        );
    }

    #[test]
    fn test_sentinels_encode_as_minus_one() {
        let mut r = reading();
        r.temperature = SENTINEL;
        r.humidity = SENTINEL;

        let payload = encode(&r).unwrap();

        assert!(payload.contains("\"temperature\":-1.00,"));
        assert!(payload.contains("\"humidity\":-1.00,"));
        let value: Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value["temperature"].as_f64(), Some(-1.0));
    }

    #[test]
    fn test_parses_back_within_precision() {
        let r = reading();
        let payload = encode(&r).unwrap();
        let value: Value = serde_json::from_str(&payload).unwrap();

        let object = value.as_object().unwrap();
        let keys: Vec<&str> = object.keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 6);

        let close = |key: &str, expected: f32, tolerance: f64| {
            let got = value[key].as_f64().unwrap();
            assert!(
                (got - f64::from(expected)).abs() <= tolerance,
                "{key}: {got} vs {expected}"
            );
        };
        close("light_intensity", r.illuminance, 0.005 + 1e-4);
        close("temperature", r.temperature, 0.005 + 1e-4);
        close("humidity", r.humidity, 0.005 + 1e-4);
        close("current", r.current, 0.0005 + 1e-5);
        close("power", r.power, 0.005 + 1e-4);
        assert_eq!(value["timestamp"].as_u64(), Some(5012));
    }

    #[test]
    fn test_field_order_is_fixed() {
        let payload = encode(&reading()).unwrap();
        let order = [
            "light_intensity",
            "temperature",
            "humidity",
            "current",
            "power",
            "timestamp",
        ];
        let positions: Vec<usize> = order
            .iter()
            .map(|key| payload.find(&format!("\"{key}\":")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_extreme_values_fit_capacity() {
        let r = Reading {
            illuminance: f32::MAX,
            temperature: -f32::MAX,
            humidity: f32::MAX,
            current: -f32::MAX,
            power: f32::MAX,
            timestamp: u64::MAX,
        };
        assert!(encode(&r).is_ok());
    }
}
