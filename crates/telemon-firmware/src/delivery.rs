//! Collector channel over the embassy-net TCP stack

use embassy_net::Stack;
use embassy_net::dns::DnsSocket;
use embassy_net::tcp::client::{TcpClient, TcpClientState};
use embassy_time::Duration;
use static_cell::StaticCell;

use telemon_core::network::http::{CollectorUrl, HttpDelivery};

const SOCKET_TIMEOUT: Duration = Duration::from_secs(10);

/// One request in flight at a time
const SOCKETS: usize = 1;
const TX_BUFFER: usize = 1024;
const RX_BUFFER: usize = 1024;

pub type StackTcp = TcpClient<'static, SOCKETS, TX_BUFFER, RX_BUFFER>;
pub type StackDelivery = HttpDelivery<'static, StackTcp, DnsSocket<'static>>;

static TCP_STATE: StaticCell<TcpClientState<SOCKETS, TX_BUFFER, RX_BUFFER>> = StaticCell::new();
static TCP_CLIENT: StaticCell<StackTcp> = StaticCell::new();
static DNS: StaticCell<DnsSocket<'static>> = StaticCell::new();

/// Build the delivery channel. Call once; the socket state lives for the
/// rest of the program.
pub fn collector_channel(stack: Stack<'static>, url: CollectorUrl<'static>) -> StackDelivery {
    let state = TCP_STATE.init(TcpClientState::new());
    let tcp = TCP_CLIENT.init(TcpClient::new(stack, state));
    tcp.set_timeout(Some(SOCKET_TIMEOUT));
    let dns = DNS.init(DnsSocket::new(stack));

    HttpDelivery::new(tcp, dns, url)
}
