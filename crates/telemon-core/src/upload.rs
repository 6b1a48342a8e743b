//! The top-level control loop.
//!
//! One cooperative task owns every component. Each tick checks the interval
//! timer; when a cycle is due it takes a fresh reading and either delivers it
//! or, when the link is down, spends the cycle reconnecting instead. Nothing
//! is queued: a reading that cannot be delivered this cycle is dropped, and a
//! failed delivery is never retried within the cycle.

use embedded_hal_async::delay::DelayNs;
use log::{debug, error, info, warn};

use crate::clock::Clock;
use crate::config::{AgentConfig, CollectorConfig, ScheduleConfig};
use crate::network::{
    ConnectivityManager, ConnectivityState, DeliveryChannel, DeliveryError, DeliveryRequest,
    NetworkLink,
};
use crate::payload;
use crate::sensors::{Reading, ReadingAssembler, SensorSource, UnitConverter, calibrate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Sampling,
    Delivering,
    Reconnecting,
}

/// What one call to [`UploadCycle::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The interval has not elapsed yet
    NotDue,
    /// The collector answered, with any status
    Delivered { status: u16 },
    DeliveryFailed(DeliveryError),
    /// The reading could not be encoded; nothing was sent
    EncodeFailed,
    /// The link was down; this cycle's reading was dropped and the link came back
    Reconnected,
    /// The link was down and is still down
    ReconnectFailed,
}

/// Running totals, for logging only.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleStats {
    pub cycles: u32,
    pub delivered: u32,
    pub failed: u32,
    pub reconnects: u32,
    pub reconnect_failures: u32,
}

impl CycleStats {
    fn record(&mut self, outcome: &CycleOutcome) {
        match outcome {
            CycleOutcome::NotDue => return,
            CycleOutcome::Delivered { .. } => self.delivered += 1,
            CycleOutcome::DeliveryFailed(_) | CycleOutcome::EncodeFailed => self.failed += 1,
            CycleOutcome::Reconnected => self.reconnects += 1,
            CycleOutcome::ReconnectFailed => self.reconnect_failures += 1,
        }
        self.cycles += 1;
    }
}

pub struct UploadCycle<'a, S, C, L, D, X> {
    assembler: ReadingAssembler<S, C>,
    connectivity: ConnectivityManager<'a, L, D>,
    channel: X,
    clock: C,
    delay: D,
    collector: CollectorConfig<'a>,
    schedule: ScheduleConfig,
    state: CycleState,
    last_cycle_ms: u64,
    stats: CycleStats,
}

impl<'a, S, C, L, D, X> UploadCycle<'a, S, C, L, D, X>
where
    S: SensorSource,
    C: Clock + Clone,
    L: NetworkLink,
    D: DelayNs + Clone,
    X: DeliveryChannel,
{
    /// Assemble the loop from already-built parts. No calibration or network
    /// activity happens here; see [`UploadCycle::start`] for the boot sequence.
    pub fn new(
        assembler: ReadingAssembler<S, C>,
        connectivity: ConnectivityManager<'a, L, D>,
        channel: X,
        clock: C,
        delay: D,
        config: &AgentConfig<'a>,
    ) -> Self {
        Self {
            assembler,
            connectivity,
            channel,
            clock,
            delay,
            collector: config.collector,
            schedule: config.schedule,
            state: CycleState::Idle,
            last_cycle_ms: 0,
            stats: CycleStats::default(),
        }
    }

    /// Boot sequence: calibrate the current sensor, then make the first
    /// connection attempt. A failed first attempt is not fatal; the loop
    /// retries on its next cycle.
    ///
    /// No load may draw current through the current sensor while this runs.
    pub async fn start(
        config: &AgentConfig<'a>,
        mut sensors: S,
        link: L,
        channel: X,
        clock: C,
        delay: D,
    ) -> Self {
        let offset = calibrate(
            &mut sensors,
            &mut delay.clone(),
            config.pins.current_channel,
            &config.adc,
            &config.calibration,
        )
        .await;

        info!("Telemetry agent initialized");
        info!("Light sensor: ADC channel {}", config.pins.light_channel);
        info!("Climate sensor: GPIO{}", config.pins.climate_pin);
        info!("Current sensor: ADC channel {}", config.pins.current_channel);
        info!("Collector URL: {}", config.collector.url);

        let converter = UnitConverter::new(config.adc, config.light, config.current, offset);
        let assembler = ReadingAssembler::new(sensors, clock.clone(), converter, config.pins);
        let mut connectivity = ConnectivityManager::new(
            link,
            delay.clone(),
            config.network,
            config.connectivity,
        );
        connectivity.connect().await;

        info!("Telemetry agent started");
        Self::new(assembler, connectivity, channel, clock, delay, config)
    }

    pub fn connectivity_state(&self) -> ConnectivityState {
        self.connectivity.state()
    }

    pub fn stats(&self) -> CycleStats {
        self.stats
    }

    pub fn converter(&self) -> &UnitConverter {
        self.assembler.converter()
    }

    fn enter(&mut self, state: CycleState) {
        if state != self.state {
            debug!("Upload cycle: {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    /// Run one timer check, and a full cycle if one is due.
    pub async fn tick(&mut self) -> CycleOutcome {
        let now = self.clock.now_ms();
        if now.saturating_sub(self.last_cycle_ms) < self.schedule.upload_interval_ms {
            return CycleOutcome::NotDue;
        }

        self.enter(CycleState::Sampling);
        let reading = self.assembler.assemble().await;
        info!("{}", reading);

        let outcome = match self.connectivity.refresh() {
            ConnectivityState::Connected => {
                self.enter(CycleState::Delivering);
                self.deliver(&reading).await
            }
            _ => {
                warn!("Network disconnected. Attempting to reconnect...");
                self.enter(CycleState::Reconnecting);
                match self.connectivity.connect().await {
                    ConnectivityState::Connected => CycleOutcome::Reconnected,
                    _ => CycleOutcome::ReconnectFailed,
                }
            }
        };

        self.last_cycle_ms = now;
        self.enter(CycleState::Idle);
        self.stats.record(&outcome);
        debug!("Cycle stats: {:?}", self.stats);

        outcome
    }

    async fn deliver(&mut self, reading: &Reading) -> CycleOutcome {
        let body = match payload::encode(reading) {
            Ok(body) => body,
            Err(e) => {
                error!("Failed to encode reading: {}", e);
                return CycleOutcome::EncodeFailed;
            }
        };

        info!("Sending data to: {}", self.collector.url);
        info!("JSON Data: {}", body.as_str());

        let request = DeliveryRequest {
            user_agent: self.collector.user_agent,
            body: body.as_str(),
        };

        match self.channel.post(&request).await {
            Ok(response) => {
                if response.is_success() {
                    info!("Data sent successfully! Response: {}", response.status);
                } else {
                    warn!("Collector answered with status {}", response.status);
                }
                info!("Server Response: {}", response.body.as_str());
                CycleOutcome::Delivered {
                    status: response.status,
                }
            }
            Err(e) => {
                error!("Error sending data: {}", e);
                error!("Failed to send data to server. Will retry next cycle.");
                CycleOutcome::DeliveryFailed(e)
            }
        }
    }

    /// One loop iteration: a tick, then `idle_poll_ms` of sleep.
    pub async fn step(&mut self) -> CycleOutcome {
        let outcome = self.tick().await;
        self.delay.delay_ms(self.schedule.idle_poll_ms).await;
        outcome
    }

    pub async fn run(&mut self) -> ! {
        loop {
            self.step().await;
        }
    }
}
