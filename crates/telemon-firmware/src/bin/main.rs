#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use embassy_executor::Spawner;
use embassy_net::Runner;
use embassy_time::Timer;
use esp_hal::clock::CpuClock;
use esp_hal::interrupt::software::SoftwareInterruptControl;
use esp_hal::rng::Rng;
use esp_hal::timer::timg::TimerGroup;
use esp_radio::wifi::WifiDevice;
use log::{error, info};

use telemon_core::config::{AgentConfig, CollectorConfig, NetworkConfig};
use telemon_core::network::http::CollectorUrl;
use telemon_core::UploadCycle;
use telemon_firmware::board::BoardSensors;
use telemon_firmware::clock::{EmbassyClock, EmbassyDelay};
use telemon_firmware::delivery;
use telemon_firmware::{site, wifi};

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

extern crate alloc;

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) -> ! {
    runner.run().await
}

/// Park forever after an unrecoverable bring-up error.
async fn halt() -> ! {
    loop {
        Timer::after_secs(1).await;
    }
}

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!(log::LevelFilter::Info);

    let hal_config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(hal_config);

    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 65536);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let sw_interrupt = SoftwareInterruptControl::new(peripherals.SW_INTERRUPT);
    esp_rtos::start(timg0.timer0, sw_interrupt.software_interrupt0);

    info!("Embassy initialized!");

    let config = AgentConfig::new(
        NetworkConfig {
            ssid: site::SSID,
            password: site::PASSWORD,
        },
        CollectorConfig::new(site::COLLECTOR_URL),
    );
    let url = match CollectorUrl::parse(config.collector.url) {
        Ok(url) => url,
        Err(e) => {
            error!("Invalid collector URL '{}': {}", config.collector.url, e);
            halt().await
        }
    };

    let sensors = BoardSensors::new(
        peripherals.ADC1,
        peripherals.GPIO0,
        peripherals.GPIO1,
        peripherals.GPIO2,
        config.pins,
    );

    let rng = Rng::new();
    let seed = (rng.random() as u64) << 32 | rng.random() as u64;
    let (link, runner) = match wifi::init(peripherals.WIFI, seed) {
        Ok(parts) => parts,
        Err(e) => {
            error!("Wi-Fi bring-up failed: {:?}", e);
            halt().await
        }
    };
    spawner.spawn(net_task(runner)).ok();

    let channel = delivery::collector_channel(link.stack(), url);

    let mut cycle =
        UploadCycle::start(&config, sensors, link, channel, EmbassyClock, EmbassyDelay).await;
    cycle.run().await
}
