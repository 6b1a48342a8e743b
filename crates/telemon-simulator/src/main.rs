//! Desktop simulator for the telemon telemetry agent.
//!
//! Runs the real upload loop from `telemon-core` against synthetic sensors and
//! a simulated Wi-Fi link that drops periodically, and POSTs readings to a real
//! collector through the same HTTP client the device uses, over std sockets. Point it at a running collector to exercise the whole
//! pipeline without hardware.
//!
//! # Environment
//!
//! | Variable                 | Default                                   |
//! |--------------------------|-------------------------------------------|
//! | `TELEMON_SSID`           | `simulated-ap`                            |
//! | `TELEMON_PASSWORD`       | (empty)                                   |
//! | `TELEMON_COLLECTOR_URL`  | `http://127.0.0.1:3000/api/sensordata`    |
//!
//! A `.env` file in the working directory is loaded first. Log output is
//! controlled with `RUST_LOG` (e.g. `RUST_LOG=info`).

use std::cell::Cell;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use embedded_io_async::{ErrorType, Read, Write};
use embedded_nal_async::{AddrType, Dns, TcpConnect};
use log::{debug, info, warn};

use telemon_core::clock::Clock;
use telemon_core::config::{AgentConfig, CollectorConfig, NetworkConfig};
use telemon_core::network::http::{CollectorUrl, HttpDelivery};
use telemon_core::network::{LinkStatus, NetworkLink};
use telemon_core::sensors::{ClimateSample, SensorError, SensorSource};
use telemon_core::{AppError, UploadCycle};

// ---------------------------------------------------------------------------
// Simulation constants
// ---------------------------------------------------------------------------

const DEFAULT_SSID: &str = "simulated-ap";
const DEFAULT_COLLECTOR_URL: &str = "http://127.0.0.1:3000/api/sensordata";

/// Status polls before the simulated access point accepts us.
const ASSOCIATION_POLLS: u32 = 3;

/// The simulated link drops after being up this long.
const LINK_UP_DURATION: Duration = Duration::from_secs(60);

/// Socket connect/read/write timeout for deliveries.
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Every Nth climate read times out, and every Mth returns NaN humidity.
const CLIMATE_TIMEOUT_EVERY: u32 = 7;
const CLIMATE_NAN_EVERY: u32 = 11;

/// Raw count where the simulated current sensor idles.
const CURRENT_ZERO_COUNTS: f64 = 2048.0;

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
struct StdClock {
    boot: Instant,
}

impl Clock for StdClock {
    fn now_ms(&self) -> u64 {
        self.boot.elapsed().as_millis() as u64
    }
}

/// Blocks the thread; the simulator runs the agent on a single thread just
/// like the device does.
#[derive(Clone, Copy)]
struct StdDelay;

impl embedded_hal_async::delay::DelayNs for StdDelay {
    async fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(ns.into()));
    }

    async fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(ms.into()));
    }
}

// ---------------------------------------------------------------------------
// Synthetic sensors
// ---------------------------------------------------------------------------

/// Generates sensor signals that vary slowly over time.
///
/// The current sensor stays at its zero point for the first `calibration_reads`
/// samples so the boot calibration sees no load.
struct SyntheticSensors {
    clock: StdClock,
    current_channel: u8,
    calibration_reads: u32,
    current_reads: u32,
    climate_reads: u32,
    noise: u32,
}

impl SyntheticSensors {
    fn new(clock: StdClock, current_channel: u8, calibration_reads: u16) -> Self {
        Self {
            clock,
            current_channel,
            calibration_reads: calibration_reads.into(),
            current_reads: 0,
            climate_reads: 0,
            noise: 0x2545_f491,
        }
    }

    /// Small deterministic jitter in `[-1, 1]`.
    fn jitter(&mut self) -> f64 {
        self.noise ^= self.noise << 13;
        self.noise ^= self.noise >> 17;
        self.noise ^= self.noise << 5;
        (self.noise as f64 / u32::MAX as f64) * 2.0 - 1.0
    }

    fn seconds(&self) -> f64 {
        self.clock.now_ms() as f64 / 1000.0
    }
}

impl SensorSource for SyntheticSensors {
    async fn read_analog(&mut self, channel: u8) -> u16 {
        let t = self.seconds();
        let counts = if channel == self.current_channel {
            self.current_reads += 1;
            let load = if self.current_reads <= self.calibration_reads {
                0.0
            } else {
                // Appliance cycling on and off, ~0-3 A
                let duty = (t / 30.0).sin().max(0.0);
                duty * 3.0 * 0.066 * (4095.0 / 3.3)
            };
            CURRENT_ZERO_COUNTS + load + 2.0 * self.jitter()
        } else {
            // Daylight swing on the photoresistor divider
            2600.0 + 900.0 * (t / 120.0).sin() + 10.0 * self.jitter()
        };

        counts.clamp(0.0, 4095.0) as u16
    }

    async fn read_digital(&mut self, _pin: u8) -> bool {
        true
    }

    async fn read_climate(&mut self) -> Result<ClimateSample, SensorError> {
        self.climate_reads += 1;
        if self.climate_reads % CLIMATE_TIMEOUT_EVERY == 0 {
            return Err(SensorError::Timeout { sensor: "DHT11" });
        }

        let t = self.seconds();
        let temperature = 23.0 + 3.0 * (t / 120.0).sin() + 0.5 * (t / 37.0).cos();
        let humidity = if self.climate_reads % CLIMATE_NAN_EVERY == 0 {
            f64::NAN
        } else {
            50.0 + 10.0 * (t / 180.0).sin() + 2.0 * (t / 23.0).cos()
        };

        Ok(ClimateSample {
            temperature_celsius: temperature as f32,
            humidity_percent: humidity as f32,
        })
    }
}

// ---------------------------------------------------------------------------
// Simulated Wi-Fi
// ---------------------------------------------------------------------------

struct SimulatedLink {
    clock: StdClock,
    associating: Cell<bool>,
    polls: Cell<u32>,
    connected_at: Cell<Option<u64>>,
}

impl SimulatedLink {
    fn new(clock: StdClock) -> Self {
        Self {
            clock,
            associating: Cell::new(false),
            polls: Cell::new(0),
            connected_at: Cell::new(None),
        }
    }
}

impl NetworkLink for SimulatedLink {
    async fn begin_association(&mut self, credentials: &NetworkConfig<'_>) {
        debug!("Associating with simulated AP '{}'", credentials.ssid);
        self.associating.set(true);
        self.polls.set(0);
    }

    fn status(&self) -> LinkStatus {
        let now = self.clock.now_ms();

        if let Some(since) = self.connected_at.get() {
            if now.saturating_sub(since) >= LINK_UP_DURATION.as_millis() as u64 {
                warn!("Simulated AP dropped the link");
                self.connected_at.set(None);
            }
        } else if self.associating.get() {
            self.polls.set(self.polls.get() + 1);
            if self.polls.get() >= ASSOCIATION_POLLS {
                self.associating.set(false);
                self.connected_at.set(Some(now));
            }
        }

        if self.connected_at.get().is_some() {
            LinkStatus::Connected
        } else {
            LinkStatus::Disconnected
        }
    }

    fn local_address(&self) -> Option<Ipv4Addr> {
        self.connected_at
            .get()
            .map(|_| Ipv4Addr::new(192, 168, 4, 2))
    }
}

// ---------------------------------------------------------------------------
// Host network stack
// ---------------------------------------------------------------------------

/// Blocking std sockets behind the async network traits the HTTP client
/// expects.
struct StdNet;

struct StdConnection {
    stream: TcpStream,
}

impl ErrorType for StdConnection {
    type Error = io::Error;
}

impl Read for StdConnection {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, io::Error> {
        io::Read::read(&mut self.stream, buf)
    }
}

impl Write for StdConnection {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, io::Error> {
        io::Write::write(&mut self.stream, buf)
    }

    async fn flush(&mut self) -> Result<(), io::Error> {
        io::Write::flush(&mut self.stream)
    }
}

impl TcpConnect for StdNet {
    type Error = io::Error;
    type Connection<'a>
        = StdConnection
    where
        Self: 'a;

    async fn connect<'a>(&'a self, remote: SocketAddr) -> Result<StdConnection, io::Error> {
        let stream = TcpStream::connect_timeout(&remote, DELIVERY_TIMEOUT)?;
        stream.set_read_timeout(Some(DELIVERY_TIMEOUT))?;
        stream.set_write_timeout(Some(DELIVERY_TIMEOUT))?;
        Ok(StdConnection { stream })
    }
}

impl Dns for StdNet {
    type Error = io::Error;

    async fn get_host_by_name(&self, host: &str, addr_type: AddrType) -> Result<IpAddr, io::Error> {
        (host, 0)
            .to_socket_addrs()?
            .map(|address| address.ip())
            .find(|ip| match addr_type {
                AddrType::IPv4 => ip.is_ipv4(),
                AddrType::IPv6 => ip.is_ipv6(),
                AddrType::Either => true,
            })
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no address for host"))
    }

    async fn get_host_by_address(
        &self,
        _addr: IpAddr,
        _result: &mut [u8],
    ) -> Result<usize, io::Error> {
        Err(io::ErrorKind::Unsupported.into())
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Boot the agent and run its upload loop forever.
async fn run_agent(config: &AgentConfig<'_>, url: CollectorUrl<'_>) -> ! {
    let clock = StdClock {
        boot: Instant::now(),
    };
    let sensors = SyntheticSensors::new(
        clock,
        config.pins.current_channel,
        config.calibration.sample_count,
    );
    let link = SimulatedLink::new(clock);
    let net = StdNet;
    let channel = HttpDelivery::new(&net, &net, url);

    let mut cycle = UploadCycle::start(config, sensors, link, channel, clock, StdDelay).await;
    cycle.run().await
}

fn main() -> Result<(), AppError> {
    // RUST_LOG may come from .env, so load it before the logger reads it
    let dotenv = dotenvy::dotenv();
    env_logger::init();
    if let Err(e) = dotenv {
        debug!("No .env loaded: {}", e);
    }

    let ssid = env_or("TELEMON_SSID", DEFAULT_SSID);
    let password = env_or("TELEMON_PASSWORD", "");
    let collector_url = env_or("TELEMON_COLLECTOR_URL", DEFAULT_COLLECTOR_URL);

    let config = AgentConfig::new(
        NetworkConfig {
            ssid: &ssid,
            password: &password,
        },
        CollectorConfig::new(&collector_url),
    );
    let url = CollectorUrl::parse(config.collector.url)?;

    info!("Starting telemon simulator");
    info!("Collector: {}", url);

    embassy_futures::block_on(run_agent(&config, url))
}
