//! Bounded-retry association with the access point.
//!
//! Every `connect()` runs the same fixed loop: request association, then poll
//! the link status at a fixed interval up to a fixed number of times. There is
//! no backoff and no background retry. If the loop gives up the manager stays
//! disconnected until the caller asks again.

use embedded_hal_async::delay::DelayNs;
use log::{debug, info, warn};

use super::{LinkStatus, NetworkLink};
use crate::config::{ConnectivityConfig, NetworkConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityState {
    Disconnected,
    /// Only observable while `connect()` is running
    Connecting,
    Connected,
}

pub struct ConnectivityManager<'a, L, D> {
    link: L,
    delay: D,
    credentials: NetworkConfig<'a>,
    config: ConnectivityConfig,
    state: ConnectivityState,
}

impl<'a, L, D> ConnectivityManager<'a, L, D>
where
    L: NetworkLink,
    D: DelayNs,
{
    pub fn new(link: L, delay: D, credentials: NetworkConfig<'a>, config: ConnectivityConfig) -> Self {
        Self {
            link,
            delay,
            credentials,
            config,
            state: ConnectivityState::Disconnected,
        }
    }

    pub fn state(&self) -> ConnectivityState {
        self.state
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    /// Sync the recorded state with the link without associating.
    ///
    /// An association that completes after [`ConnectivityManager::connect`]
    /// gave up is picked up here.
    pub fn refresh(&mut self) -> ConnectivityState {
        let live = match self.link.status() {
            LinkStatus::Connected => ConnectivityState::Connected,
            LinkStatus::Disconnected => ConnectivityState::Disconnected,
        };

        if live != self.state {
            match live {
                ConnectivityState::Connected => match self.link.local_address() {
                    Some(ip) => info!("Network link recovered! IP: {}", ip),
                    None => info!("Network link recovered"),
                },
                _ => warn!("Network link lost"),
            }
            self.state = live;
        }
        self.state
    }

    /// Associate and wait up to `max_attempts` polls for the link to come up.
    pub async fn connect(&mut self) -> ConnectivityState {
        info!("Connecting to {}", self.credentials.ssid);
        self.state = ConnectivityState::Connecting;
        self.link.begin_association(&self.credentials).await;

        let mut attempts = 0;
        while self.link.status() != LinkStatus::Connected && attempts < self.config.max_attempts {
            self.delay.delay_ms(self.config.poll_interval_ms).await;
            attempts += 1;
            debug!("Link still down after {} poll(s)", attempts);
        }

        if self.link.status() == LinkStatus::Connected {
            self.state = ConnectivityState::Connected;
            match self.link.local_address() {
                Some(address) => info!("Network connected! IP: {}", address),
                None => info!("Network connected!"),
            }
        } else {
            self.state = ConnectivityState::Disconnected;
            warn!(
                "Network connection failed after {} attempts",
                self.config.max_attempts
            );
        }

        self.state
    }
}
