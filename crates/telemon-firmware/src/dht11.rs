//! Bit-banged DHT11 temperature/humidity driver
//!
//! The DHT11 talks over a single open-drain line with an external pull-up.
//! A transaction is:
//!
//! 1. Host pulls the line low for at least 18 ms, then releases it.
//! 2. Sensor answers with 80 µs low, 80 µs high.
//! 3. Sensor sends 40 bits. Each bit is ~50 µs low followed by a high pulse of
//!    ~27 µs (`0`) or ~70 µs (`1`).
//!
//! The 40 bits are humidity (integral, decimal), temperature (integral,
//! decimal) and a checksum byte. Bit timing is measured by counting 1 µs
//! polling steps, and each bit is decided by comparing its high pulse with
//! the low pulse that preceded it, so loop overhead cancels out.

use embassy_time::Timer;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::{debug, warn};

use telemon_core::sensors::{ClimateSample, SensorError};

const SENSOR: &str = "DHT11";

/// Host start pulse length
const START_LOW_MS: u64 = 20;

/// Generous upper bound for any single phase of the response, in polling steps
const PHASE_TIMEOUT_STEPS: u32 = 200;

pub struct Dht11<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> Dht11<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    /// `pin` must be configured open-drain with input enabled.
    pub fn new(mut pin: P, delay: D) -> Self {
        // Idle high; the pull-up holds the line while released
        if let Err(e) = pin.set_high() {
            warn!("{} line could not be released: {:?}", SENSOR, e);
        }
        Self { pin, delay }
    }

    /// Current logic level of the data line.
    pub fn line_is_high(&mut self) -> bool {
        self.pin.is_high().unwrap_or(false)
    }

    /// Run one transaction and decode it.
    pub async fn read(&mut self) -> Result<ClimateSample, SensorError> {
        self.pin.set_low().map_err(|_| SensorError::ReadFailed {
            sensor: SENSOR,
            operation: "start pulse",
        })?;
        Timer::after_millis(START_LOW_MS).await;

        // Response and data bits are timing-critical
        let frame = critical_section::with(|_| self.read_frame())?;
        debug!("DHT11 frame: {:02x?}", frame);

        decode(frame)
    }

    fn read_frame(&mut self) -> Result<[u8; 5], SensorError> {
        self.pin.set_high().map_err(|_| SensorError::ReadFailed {
            sensor: SENSOR,
            operation: "release line",
        })?;

        // Sensor acknowledges: low, high, then low for the first bit
        self.wait_while(true)?;
        self.wait_while(false)?;
        self.wait_while(true)?;

        let mut frame = [0u8; 5];
        for bit in 0..40 {
            let low = self.wait_while(false)?;
            let high = self.wait_while(true)?;
            if high > low {
                frame[bit / 8] |= 0x80 >> (bit % 8);
            }
        }

        Ok(frame)
    }

    /// Wait while the line sits at `level`, returning how many 1 µs polling
    /// steps that took.
    fn wait_while(&mut self, level: bool) -> Result<u32, SensorError> {
        let mut steps = 0;
        while self.line_is_high() == level {
            if steps >= PHASE_TIMEOUT_STEPS {
                return Err(SensorError::Timeout { sensor: SENSOR });
            }
            self.delay.delay_us(1);
            steps += 1;
        }
        Ok(steps)
    }
}

/// Validate the checksum and convert a raw frame.
pub fn decode(frame: [u8; 5]) -> Result<ClimateSample, SensorError> {
    let sum = frame[..4]
        .iter()
        .fold(0u8, |acc, byte| acc.wrapping_add(*byte));
    if sum != frame[4] {
        return Err(SensorError::InvalidData { sensor: SENSOR });
    }

    let humidity = frame[0] as f32 + frame[1] as f32 / 10.0;
    let magnitude = frame[2] as f32 + (frame[3] & 0x7f) as f32 / 10.0;
    let temperature = if frame[3] & 0x80 != 0 {
        -magnitude
    } else {
        magnitude
    };

    Ok(ClimateSample {
        temperature_celsius: temperature,
        humidity_percent: humidity,
    })
}
