//! HTTP delivery over any `embedded-nal-async` TCP and DNS stack.
//!
//! The request itself is framed by `reqwless`; this module only validates the
//! collector URL at start-up and maps client errors onto [`DeliveryError`].

use core::fmt;

use embedded_io_async::ErrorKind;
use embedded_nal_async::{Dns, TcpConnect};
use log::debug;
use reqwless::client::HttpClient;
use reqwless::headers::ContentType;
use reqwless::request::{Method, RequestBuilder};

use super::{DeliveryChannel, DeliveryError, DeliveryRequest, DeliveryResponse};
use crate::config::ConfigError;

const DEFAULT_HTTP_PORT: u16 = 80;

/// Collector address, checked once at start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectorUrl<'a> {
    raw: &'a str,
    pub host: &'a str,
    pub port: u16,
    pub path: &'a str,
}

impl<'a> CollectorUrl<'a> {
    /// Parse `http://host[:port][/path]`.
    pub fn parse(url: &'a str) -> Result<Self, ConfigError> {
        let rest = match url.split_once("://") {
            Some(("http", rest)) => rest,
            Some(_) => return Err(ConfigError::UnsupportedScheme),
            None => return Err(ConfigError::InvalidUrl),
        };

        let (authority, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, "/"),
        };

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse().map_err(|_| ConfigError::InvalidPort)?;
                (host, port)
            }
            None => (authority, DEFAULT_HTTP_PORT),
        };

        if host.is_empty() {
            return Err(ConfigError::InvalidUrl);
        }
        if port == 0 {
            return Err(ConfigError::InvalidPort);
        }

        Ok(Self {
            raw: url,
            host,
            port,
            path,
        })
    }

    /// The URL exactly as configured.
    pub fn as_str(&self) -> &'a str {
        self.raw
    }
}

impl fmt::Display for CollectorUrl<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.raw)
    }
}

/// Receive buffer for the status line, headers and body of one response.
pub const RX_BUFFER_SIZE: usize = 1024;

/// POSTs JSON to a fixed collector URL through a `reqwless` client.
pub struct HttpDelivery<'a, T, D>
where
    T: TcpConnect + 'a,
    D: Dns + 'a,
{
    client: HttpClient<'a, T, D>,
    url: CollectorUrl<'a>,
}

impl<'a, T, D> HttpDelivery<'a, T, D>
where
    T: TcpConnect + 'a,
    D: Dns + 'a,
{
    pub fn new(tcp: &'a T, dns: &'a D, url: CollectorUrl<'a>) -> Self {
        Self {
            client: HttpClient::new(tcp, dns),
            url,
        }
    }
}

/// Errors before the request is on the wire mean the collector was never
/// reached.
fn connect_error(e: reqwless::Error) -> DeliveryError {
    debug!("Collector connection failed: {:?}", e);
    match e {
        reqwless::Error::Dns => DeliveryError::Dns,
        reqwless::Error::InvalidUrl(_) => DeliveryError::InvalidUrl,
        reqwless::Error::Network(ErrorKind::TimedOut) => DeliveryError::Timeout,
        _ => DeliveryError::Connect,
    }
}

fn exchange_error(e: reqwless::Error) -> DeliveryError {
    debug!("HTTP exchange failed: {:?}", e);
    match e {
        reqwless::Error::Network(ErrorKind::TimedOut) => DeliveryError::Timeout,
        reqwless::Error::Network(_) | reqwless::Error::ConnectionAborted => DeliveryError::Io,
        reqwless::Error::BufferTooSmall => DeliveryError::ResponseTooLarge,
        reqwless::Error::Dns => DeliveryError::Dns,
        reqwless::Error::InvalidUrl(_) => DeliveryError::InvalidUrl,
        _ => DeliveryError::MalformedResponse,
    }
}

impl<'a, T, D> DeliveryChannel for HttpDelivery<'a, T, D>
where
    T: TcpConnect + 'a,
    D: Dns + 'a,
{
    async fn post(
        &mut self,
        request: &DeliveryRequest<'_>,
    ) -> Result<DeliveryResponse, DeliveryError> {
        let headers = [("User-Agent", request.user_agent)];
        let mut rx_buffer = [0u8; RX_BUFFER_SIZE];

        let mut handle = self
            .client
            .request(Method::POST, self.url.as_str())
            .await
            .map_err(connect_error)?
            .body(request.body.as_bytes())
            .content_type(ContentType::ApplicationJson)
            .headers(&headers);

        let response = handle.send(&mut rx_buffer).await.map_err(exchange_error)?;
        let status = response.status.0;
        let body = response
            .body()
            .read_to_end()
            .await
            .map_err(exchange_error)?;

        Ok(DeliveryResponse::new(status, body))
    }
}
