//! Embassy-backed time source and async delay

use embassy_time::{Instant, Timer};
use telemon_core::clock::Clock;

/// Milliseconds since boot from the embassy time driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }
}

/// Yields to the executor for the whole wait, so the network runner keeps
/// going while the agent sleeps.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyDelay;

impl embedded_hal_async::delay::DelayNs for EmbassyDelay {
    async fn delay_ns(&mut self, ns: u32) {
        Timer::after_nanos(ns.into()).await;
    }

    async fn delay_us(&mut self, us: u32) {
        Timer::after_micros(us.into()).await;
    }

    async fn delay_ms(&mut self, ms: u32) {
        Timer::after_millis(ms.into()).await;
    }
}
