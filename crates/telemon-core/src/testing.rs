//! Test doubles for the capability traits.
//!
//! Time is virtual: [`MockDelay`] advances the [`MockClock`] it shares with the
//! code under test, so bounded-retry loops complete instantly.

use core::cell::{Cell, RefCell};
use core::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::collections::VecDeque;

use embedded_hal_async::delay::DelayNs;
use embedded_io_async::{ErrorKind, ErrorType, Read, Write};
use embedded_nal_async::{AddrType, Dns, TcpConnect};

use crate::clock::Clock;
use crate::config::NetworkConfig;
use crate::network::{
    DeliveryChannel, DeliveryError, DeliveryRequest, DeliveryResponse, LinkStatus, NetworkLink,
};
use crate::sensors::{ClimateSample, SensorError, SensorSource};

#[derive(Default)]
pub struct MockClock {
    now_ns: Cell<u64>,
}

impl MockClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_ms(&self, ms: u64) {
        self.now_ns.set(ms * 1_000_000);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance_ns(ms * 1_000_000);
    }

    pub fn advance_ns(&self, ns: u64) {
        self.now_ns.set(self.now_ns.get() + ns);
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.now_ns.get() / 1_000_000
    }
}

#[derive(Clone, Copy)]
pub struct MockDelay<'a> {
    clock: &'a MockClock,
}

impl<'a> MockDelay<'a> {
    pub fn new(clock: &'a MockClock) -> Self {
        Self { clock }
    }
}

impl DelayNs for MockDelay<'_> {
    async fn delay_ns(&mut self, ns: u32) {
        self.clock.advance_ns(ns.into());
    }

    async fn delay_us(&mut self, us: u32) {
        self.clock.advance_ns(u64::from(us) * 1_000);
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.clock.advance_ms(ms.into());
    }
}

/// Sensor source with fixed analog levels per channel and a queue of climate
/// results. Once the queue runs dry every climate read succeeds with
/// `fallback_climate`.
pub struct ScriptedSensors {
    pub analog: [u16; 8],
    pub digital: [bool; 8],
    pub climate: VecDeque<Result<ClimateSample, SensorError>>,
    pub fallback_climate: ClimateSample,
    pub analog_reads: Vec<u8>,
    pub climate_reads: usize,
}

impl ScriptedSensors {
    pub fn new() -> Self {
        Self {
            analog: [0; 8],
            digital: [false; 8],
            climate: VecDeque::new(),
            fallback_climate: ClimateSample {
                temperature_celsius: 21.5,
                humidity_percent: 45.25,
            },
            analog_reads: Vec::new(),
            climate_reads: 0,
        }
    }

    pub fn with_analog(mut self, channel: u8, value: u16) -> Self {
        self.analog[channel as usize] = value;
        self
    }

    pub fn push_climate(&mut self, result: Result<ClimateSample, SensorError>) {
        self.climate.push_back(result);
    }
}

impl SensorSource for ScriptedSensors {
    async fn read_analog(&mut self, channel: u8) -> u16 {
        self.analog_reads.push(channel);
        self.analog[channel as usize]
    }

    async fn read_digital(&mut self, pin: u8) -> bool {
        self.digital[pin as usize]
    }

    async fn read_climate(&mut self) -> Result<ClimateSample, SensorError> {
        self.climate_reads += 1;
        self.climate
            .pop_front()
            .unwrap_or(Ok(self.fallback_climate))
    }
}

/// Network link that reports connected after a set number of status polls
/// following an association request. `None` never connects.
///
/// Implemented on `&ScriptedLink` so a test can keep a handle and drop the
/// link while the code under test owns it. A dropped link stays down until
/// the next association request.
pub struct ScriptedLink {
    pub connect_after_polls: Option<u32>,
    pub associations: Cell<u32>,
    pub status_polls: Cell<u32>,
    pub last_ssid: RefCell<String>,
    connected: Cell<bool>,
    dropped: Cell<bool>,
    polls_since_association: Cell<u32>,
}

impl ScriptedLink {
    pub fn new(connect_after_polls: Option<u32>) -> Self {
        Self {
            connect_after_polls,
            associations: Cell::new(0),
            status_polls: Cell::new(0),
            last_ssid: RefCell::new(String::new()),
            connected: Cell::new(false),
            dropped: Cell::new(false),
            polls_since_association: Cell::new(0),
        }
    }

    pub fn connected() -> Self {
        let link = Self::new(Some(0));
        link.connected.set(true);
        link
    }

    pub fn drop_link(&self) {
        self.connected.set(false);
        self.dropped.set(true);
    }

    /// The access point accepts an association that was still pending.
    pub fn come_up(&self) {
        self.connected.set(true);
        self.dropped.set(false);
    }
}

impl NetworkLink for &ScriptedLink {
    async fn begin_association(&mut self, credentials: &NetworkConfig<'_>) {
        self.associations.set(self.associations.get() + 1);
        self.polls_since_association.set(0);
        self.dropped.set(false);
        *self.last_ssid.borrow_mut() = String::from(credentials.ssid);
    }

    fn status(&self) -> LinkStatus {
        self.status_polls.set(self.status_polls.get() + 1);
        if !self.connected.get() && !self.dropped.get() && self.associations.get() > 0 {
            if let Some(after) = self.connect_after_polls {
                if self.polls_since_association.get() >= after {
                    self.connected.set(true);
                }
            }
            self.polls_since_association
                .set(self.polls_since_association.get() + 1);
        }

        if self.connected.get() {
            LinkStatus::Connected
        } else {
            LinkStatus::Disconnected
        }
    }

    fn local_address(&self) -> Option<core::net::Ipv4Addr> {
        self.connected
            .get()
            .then_some(core::net::Ipv4Addr::new(192, 168, 4, 20))
    }
}

/// Delivery channel that records every request and answers from a queue,
/// defaulting to `200 OK`.
#[derive(Default)]
pub struct RecordingChannel {
    pub bodies: Vec<String>,
    pub user_agents: Vec<String>,
    pub responses: VecDeque<Result<u16, DeliveryError>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DeliveryChannel for RecordingChannel {
    async fn post(
        &mut self,
        request: &DeliveryRequest<'_>,
    ) -> Result<DeliveryResponse, DeliveryError> {
        self.bodies.push(String::from(request.body));
        self.user_agents.push(String::from(request.user_agent));

        let status = self.responses.pop_front().unwrap_or(Ok(200))?;
        Ok(DeliveryResponse::new(status, b"{\"ok\":true}"))
    }
}

/// In-memory TCP peer and resolver. Every connection records what the client
/// writes and replays the same canned response.
pub struct MockServer {
    pub response: &'static [u8],
    pub refuse: bool,
    pub dns_fails: bool,
    pub lookups: RefCell<Vec<String>>,
    pub remote: Cell<Option<SocketAddr>>,
    written: RefCell<Vec<u8>>,
}

impl MockServer {
    pub fn replying(response: &'static [u8]) -> Self {
        Self {
            response,
            refuse: false,
            dns_fails: false,
            lookups: RefCell::new(Vec::new()),
            remote: Cell::new(None),
            written: RefCell::new(Vec::new()),
        }
    }

    /// Everything the client wrote, as text.
    pub fn sent(&self) -> String {
        String::from_utf8_lossy(&self.written.borrow()).into_owned()
    }
}

pub struct MockConnection<'a> {
    server: &'a MockServer,
    read_pos: usize,
}

impl ErrorType for MockConnection<'_> {
    type Error = ErrorKind;
}

impl Read for MockConnection<'_> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, ErrorKind> {
        let remaining = &self.server.response[self.read_pos..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.read_pos += n;
        Ok(n)
    }
}

impl Write for MockConnection<'_> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, ErrorKind> {
        self.server.written.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), ErrorKind> {
        Ok(())
    }
}

impl TcpConnect for MockServer {
    type Error = ErrorKind;
    type Connection<'a>
        = MockConnection<'a>
    where
        Self: 'a;

    async fn connect<'a>(&'a self, remote: SocketAddr) -> Result<MockConnection<'a>, ErrorKind> {
        if self.refuse {
            return Err(ErrorKind::ConnectionRefused);
        }
        self.remote.set(Some(remote));
        Ok(MockConnection {
            server: self,
            read_pos: 0,
        })
    }
}

impl Dns for MockServer {
    type Error = ErrorKind;

    async fn get_host_by_name(&self, host: &str, _addr_type: AddrType) -> Result<IpAddr, ErrorKind> {
        self.lookups.borrow_mut().push(String::from(host));
        if self.dns_fails {
            return Err(ErrorKind::NotFound);
        }
        Ok(IpAddr::V4(
            host.parse::<Ipv4Addr>().unwrap_or(Ipv4Addr::new(10, 0, 0, 2)),
        ))
    }

    async fn get_host_by_address(&self, _addr: IpAddr, _result: &mut [u8]) -> Result<usize, ErrorKind> {
        Err(ErrorKind::Unsupported)
    }
}
