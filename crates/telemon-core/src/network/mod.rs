//! Network association and payload delivery.

pub mod connectivity;
pub mod delivery;
pub mod http;

pub use connectivity::{ConnectivityManager, ConnectivityState};
pub use delivery::{
    DeliveryChannel, DeliveryError, DeliveryRequest, DeliveryResponse, RESPONSE_BODY_CAPACITY,
};

use core::net::Ipv4Addr;

use crate::config::NetworkConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Connected,
    Disconnected,
}

/// Association with an access point and address acquisition.
pub trait NetworkLink {
    /// Start associating with the access point. Completion is observed by
    /// polling [`NetworkLink::status`].
    fn begin_association(&mut self, credentials: &NetworkConfig<'_>) -> impl Future<Output = ()>;

    fn status(&self) -> LinkStatus;

    /// Informational only.
    fn local_address(&self) -> Option<Ipv4Addr>;
}

impl<T: NetworkLink + ?Sized> NetworkLink for &mut T {
    #[inline]
    async fn begin_association(&mut self, credentials: &NetworkConfig<'_>) {
        T::begin_association(self, credentials).await
    }

    #[inline]
    fn status(&self) -> LinkStatus {
        T::status(self)
    }

    #[inline]
    fn local_address(&self) -> Option<Ipv4Addr> {
        T::local_address(self)
    }
}
