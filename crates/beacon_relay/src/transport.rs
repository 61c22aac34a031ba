//! Outbound pixel transport.
//!
//! A transport fires one GET and forgets about it. Creating a transport is
//! the only fallible step on the relay path.

use beacon_protocol::TransportUnavailable;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, trace, warn};

/// Upper bound on a single pixel request.
const PIXEL_TIMEOUT: Duration = Duration::from_secs(10);

/// One-shot outbound request.
pub trait Transport: Send {
    /// Issue a GET for `url`. Never blocks and never reports the response.
    fn fire(&self, url: &str);
}

/// Builds a transport for each repeated beacon.
pub trait TransportFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn Transport>, TransportUnavailable>;
}

/// Pixel requests over a shared `reqwest` client.
pub struct PixelTransportFactory {
    client: Result<reqwest::Client, String>,
}

impl PixelTransportFactory {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(PIXEL_TIMEOUT)
            .build()
            .map_err(|e| e.to_string());
        if let Err(err) = &client {
            warn!("Pixel HTTP client could not be built, beacons will be dropped: {}", err);
        }
        Self { client }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client: Ok(client) }
    }
}

impl Default for PixelTransportFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportFactory for PixelTransportFactory {
    fn create(&self) -> Result<Box<dyn Transport>, TransportUnavailable> {
        let client = self
            .client
            .as_ref()
            .map_err(|e| TransportUnavailable::new(format!("HTTP client unavailable: {}", e)))?
            .clone();
        let runtime = Handle::try_current()
            .map_err(|e| TransportUnavailable::new(format!("no async runtime: {}", e)))?;
        Ok(Box::new(PixelTransport { client, runtime }))
    }
}

/// A single pixel load, spawned onto the runtime it was created on.
pub struct PixelTransport {
    client: reqwest::Client,
    runtime: Handle,
}

impl Transport for PixelTransport {
    fn fire(&self, url: &str) {
        let request = self.client.get(url);
        let url = url.to_string();
        self.runtime.spawn(async move {
            match request.send().await {
                Ok(response) => trace!(status = %response.status(), "Pixel delivered"),
                Err(err) => debug!("Pixel request to {} failed: {}", url, err),
            }
        });
    }
}
