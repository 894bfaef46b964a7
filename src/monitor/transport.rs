use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use crate::monitor::constants::JSON_CONTENT_TYPE;
use crate::monitor::error::{network_error, timeout_error, MonitorResult};
use crate::platform::host::PageHost;
use crate::platform::runtime;

/// Best-effort delivery primitive that never waits for a response.
pub trait BeaconTransport: Send + Sync {
    /// Queues `body` for delivery to `endpoint`. Returns `false` when the host refused it.
    fn try_send(&self, endpoint: &str, body: &str) -> bool;
}

/// Delivery primitive that waits for an explicit outcome.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait RequestTransport: Send + Sync {
    /// POSTs `body` to `endpoint`. Non-2xx responses, network failures and timeouts are errors.
    async fn send(&self, endpoint: &str, body: String, timeout: Duration) -> MonitorResult<()>;
}

/// [`RequestTransport`] backed by `reqwest`.
#[derive(Clone, Debug, Default)]
pub struct HttpRequestTransport {
    client: Client,
}

impl HttpRequestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl RequestTransport for HttpRequestTransport {
    async fn send(&self, endpoint: &str, body: String, timeout: Duration) -> MonitorResult<()> {
        let request = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(body)
            .send();

        let response = runtime::with_timeout(request, timeout)
            .await
            .map_err(|_| {
                timeout_error(format!(
                    "report request timed out after {}ms",
                    timeout.as_millis()
                ))
            })?
            .map_err(|err| network_error(format!("report request failed: {err}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(network_error(format!("HTTP Error: {}", status.as_u16())))
    }
}

/// The page host together with the transports the monitor delivers through.
#[derive(Clone)]
pub struct HostBindings {
    pub host: Arc<dyn PageHost>,
    /// Preferred transport. `None` when the host has no fire-and-forget channel.
    pub beacon: Option<Arc<dyn BeaconTransport>>,
    pub request: Arc<dyn RequestTransport>,
}

impl HostBindings {
    /// Binds `host` with the reqwest request transport and no beacon channel.
    pub fn new(host: Arc<dyn PageHost>) -> Self {
        Self {
            host,
            beacon: None,
            request: Arc::new(HttpRequestTransport::new()),
        }
    }

    pub fn with_beacon(mut self, beacon: Arc<dyn BeaconTransport>) -> Self {
        self.beacon = Some(beacon);
        self
    }

    pub fn with_request_transport(mut self, request: Arc<dyn RequestTransport>) -> Self {
        self.request = request;
        self
    }

    /// Bindings for the current browser window, using `navigator.sendBeacon` when present.
    #[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
    pub fn browser() -> Self {
        use crate::platform::browser::{BrowserHost, NavigatorBeacon};

        let bindings = Self::new(Arc::new(BrowserHost::new()));
        match NavigatorBeacon::detect() {
            Some(beacon) => bindings.with_beacon(Arc::new(beacon)),
            None => bindings,
        }
    }
}
