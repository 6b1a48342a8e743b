//! Wi-Fi station link
//!
//! Association is requested through the radio controller; "connected" means
//! the embassy-net stack has both link and a DHCP lease.

use alloc::string::ToString;
use core::net::Ipv4Addr;

use embassy_net::{Runner, Stack, StackResources};
use esp_hal::peripherals::WIFI;
use esp_radio::wifi::{ClientConfig, ModeConfig, WifiController, WifiDevice};
use log::{error, info};
use static_cell::StaticCell;

use telemon_core::config::NetworkConfig;
use telemon_core::network::{LinkStatus, NetworkLink};

static RADIO: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();
static NET_RESOURCES: StaticCell<StackResources<3>> = StaticCell::new();

#[derive(Debug)]
pub enum BringUpError {
    Radio(esp_radio::InitializationError),
    Wifi(esp_radio::wifi::WifiError),
}

pub struct WifiLink {
    controller: WifiController<'static>,
    stack: Stack<'static>,
}

/// Bring up the radio and network stack. The returned runner must be polled
/// (see `net_task`) for the stack to make progress.
pub fn init(
    wifi: WIFI<'static>,
    seed: u64,
) -> Result<(WifiLink, Runner<'static, WifiDevice<'static>>), BringUpError> {
    let radio = RADIO.init(esp_radio::init().map_err(BringUpError::Radio)?);
    let (controller, interfaces) =
        esp_radio::wifi::new(radio, wifi, esp_radio::wifi::Config::default())
            .map_err(BringUpError::Wifi)?;

    let (stack, runner) = embassy_net::new(
        interfaces.sta,
        embassy_net::Config::dhcpv4(Default::default()),
        NET_RESOURCES.init(StackResources::<3>::new()),
        seed,
    );

    Ok((WifiLink { controller, stack }, runner))
}

impl WifiLink {
    pub fn stack(&self) -> Stack<'static> {
        self.stack
    }
}

impl NetworkLink for WifiLink {
    async fn begin_association(&mut self, credentials: &NetworkConfig<'_>) {
        let mode = ModeConfig::Client(
            ClientConfig::default()
                .with_ssid(credentials.ssid.to_string())
                .with_password(credentials.password.to_string()),
        );
        if let Err(e) = self.controller.set_config(&mode) {
            error!("Wi-Fi config rejected: {:?}", e);
            return;
        }

        if !self.controller.is_started().unwrap_or(false) {
            if let Err(e) = self.controller.start_async().await {
                error!("Wi-Fi start failed: {:?}", e);
                return;
            }
            info!("Wi-Fi started");
        }

        // Completion is observed through `status()`
        if let Err(e) = self.controller.connect() {
            error!("Wi-Fi connect request failed: {:?}", e);
        }
    }

    fn status(&self) -> LinkStatus {
        if self.stack.is_link_up() && self.stack.config_v4().is_some() {
            LinkStatus::Connected
        } else {
            LinkStatus::Disconnected
        }
    }

    fn local_address(&self) -> Option<Ipv4Addr> {
        self.stack.config_v4().map(|config| config.address.address())
    }
}
