//! Sensor wiring for the ESP32-C3 board
//!
//! | Signal          | Pin   | Peripheral        |
//! |-----------------|-------|-------------------|
//! | Photoresistor   | GPIO0 | ADC1, 11 dB       |
//! | DHT11 data      | GPIO1 | open-drain GPIO   |
//! | ACS712 output   | GPIO2 | ADC1, 11 dB       |

use embassy_futures::yield_now;
use esp_hal::Blocking;
use esp_hal::analog::adc::{Adc, AdcConfig, AdcPin, Attenuation};
use esp_hal::delay::Delay;
use esp_hal::gpio::{DriveMode, Flex, InputConfig, OutputConfig, Pull};
use esp_hal::peripherals::{ADC1, GPIO0, GPIO1, GPIO2};
use log::warn;

use telemon_core::config::PinConfig;
use telemon_core::sensors::{ClimateSample, SensorError, SensorSource};

use crate::dht11::Dht11;

pub type LightPin = AdcPin<GPIO0<'static>, ADC1<'static>>;
pub type CurrentPin = AdcPin<GPIO2<'static>, ADC1<'static>>;

pub struct BoardSensors {
    adc: Adc<'static, ADC1<'static>, Blocking>,
    light: LightPin,
    current: CurrentPin,
    climate: Dht11<Flex<'static>, Delay>,
    pins: PinConfig,
}

impl BoardSensors {
    pub fn new(
        adc1: ADC1<'static>,
        light: GPIO0<'static>,
        climate: GPIO1<'static>,
        current: GPIO2<'static>,
        pins: PinConfig,
    ) -> Self {
        // 11 dB attenuation covers the full 0-3.3 V range
        let mut adc_config = AdcConfig::new();
        let light = adc_config.enable_pin(light, Attenuation::_11dB);
        let current = adc_config.enable_pin(current, Attenuation::_11dB);
        let adc = Adc::new(adc1, adc_config);

        let mut data = Flex::new(climate);
        data.apply_output_config(
            &OutputConfig::default()
                .with_drive_mode(DriveMode::OpenDrain)
                .with_pull(Pull::Up),
        );
        data.apply_input_config(&InputConfig::default().with_pull(Pull::Up));
        data.set_input_enable(true);
        data.set_output_enable(true);

        Self {
            adc,
            light,
            current,
            climate: Dht11::new(data, Delay::new()),
            pins,
        }
    }
}

impl SensorSource for BoardSensors {
    async fn read_analog(&mut self, channel: u8) -> u16 {
        if channel == self.pins.light_channel {
            loop {
                if let Ok(count) = self.adc.read_oneshot(&mut self.light) {
                    return count;
                }
                yield_now().await;
            }
        } else if channel == self.pins.current_channel {
            loop {
                if let Ok(count) = self.adc.read_oneshot(&mut self.current) {
                    return count;
                }
                yield_now().await;
            }
        } else {
            warn!("No analog input wired to channel {}", channel);
            0
        }
    }

    async fn read_digital(&mut self, pin: u8) -> bool {
        if pin == self.pins.climate_pin {
            self.climate.line_is_high()
        } else {
            warn!("No digital input wired to GPIO{}", pin);
            false
        }
    }

    async fn read_climate(&mut self) -> Result<ClimateSample, SensorError> {
        self.climate.read().await
    }
}
