use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONNECTION;
use reqwest::redirect::Policy;

use crate::resolver::LocationProbe;

/// Host name every candidate address is asked to serve.
pub const PROBE_HOST: &str = "cloudflare.com";
/// Response header whose value ends in `-<location code>`.
pub const MARKER_HEADER: &str = "cf-ray";

const HTTP_PORT: u16 = 80;

/// Header-only HTTP probe sent straight to a candidate address.
///
/// DNS is bypassed by pinning [`PROBE_HOST`] to the candidate address, so the
/// request carries the well-known host name while connecting to the address
/// under test. Redirects are never followed and connections are not reused.
/// The pinned client is built once per address and kept until the address is
/// released, so retries share it.
#[derive(Debug)]
pub struct HttpLocationProbe {
    host: String,
    port: u16,
    timeout: Duration,
    clients: Mutex<HashMap<IpAddr, reqwest::Client>>,
}

impl HttpLocationProbe {
    pub fn new(timeout: Duration) -> Self {
        Self {
            host: PROBE_HOST.to_string(),
            port: HTTP_PORT,
            timeout,
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    fn url(&self) -> String {
        if self.port == HTTP_PORT {
            format!("http://{}/", self.host)
        } else {
            format!("http://{}:{}/", self.host, self.port)
        }
    }

    fn clients(&self) -> std::sync::MutexGuard<'_, HashMap<IpAddr, reqwest::Client>> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn client_for(&self, addr: IpAddr) -> reqwest::Result<reqwest::Client> {
        if let Some(client) = self.clients().get(&addr) {
            return Ok(client.clone());
        }

        let client = reqwest::Client::builder()
            .resolve(&self.host, SocketAddr::new(addr, self.port))
            .redirect(Policy::none())
            .timeout(self.timeout)
            .pool_max_idle_per_host(0)
            .no_proxy()
            .build()?;
        self.clients().insert(addr, client.clone());
        Ok(client)
    }
}

#[async_trait]
impl LocationProbe for HttpLocationProbe {
    async fn probe(&self, addr: IpAddr) -> anyhow::Result<Option<String>> {
        let client = self.client_for(addr)?;
        let response = client
            .head(self.url())
            .header(CONNECTION, "close")
            .send()
            .await?;

        let marker = response
            .headers()
            .get(MARKER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        Ok(marker)
    }

    fn release(&self, addr: IpAddr) {
        self.clients().remove(&addr);
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
