//! Delivery of an encoded payload to the collector.

use thiserror_no_std::Error;

/// Bytes of the collector's response body kept for logging.
pub const RESPONSE_BODY_CAPACITY: usize = 256;

/// One JSON POST. The destination is fixed when the channel is built.
#[derive(Debug, Clone, Copy)]
pub struct DeliveryRequest<'a> {
    pub user_agent: &'a str,
    pub body: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResponse {
    pub status: u16,
    /// Truncated to [`RESPONSE_BODY_CAPACITY`] bytes at a character boundary
    pub body: heapless::String<RESPONSE_BODY_CAPACITY>,
}

impl DeliveryResponse {
    /// Build a response from raw body bytes. Invalid UTF-8 ends the body at
    /// the last valid character.
    pub fn new(status: u16, body: &[u8]) -> Self {
        let text = match core::str::from_utf8(body) {
            Ok(text) => text,
            Err(e) => core::str::from_utf8(&body[..e.valid_up_to()]).unwrap_or_default(),
        };

        let mut kept = heapless::String::new();
        for c in text.chars() {
            if kept.push(c).is_err() {
                break;
            }
        }

        Self { status, body: kept }
    }

    /// 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("connection refused")]
    Connect,
    #[error("could not resolve collector host")]
    Dns,
    #[error("connection lost during exchange")]
    Io,
    #[error("read timeout")]
    Timeout,
    #[error("malformed HTTP response")]
    MalformedResponse,
    #[error("response exceeds receive buffer")]
    ResponseTooLarge,
    #[error("collector URL rejected by HTTP client")]
    InvalidUrl,
}

/// Transport to the collector: a single blocking POST with its own internal
/// timeout.
///
/// Any HTTP response counts as delivered, whatever its status. Errors are
/// reserved for failures to complete the exchange.
pub trait DeliveryChannel {
    fn post(
        &mut self,
        request: &DeliveryRequest<'_>,
    ) -> impl Future<Output = Result<DeliveryResponse, DeliveryError>>;
}

impl<T: DeliveryChannel + ?Sized> DeliveryChannel for &mut T {
    #[inline]
    async fn post(
        &mut self,
        request: &DeliveryRequest<'_>,
    ) -> Result<DeliveryResponse, DeliveryError> {
        T::post(self, request).await
    }
}
