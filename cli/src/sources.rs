//! Fetches the range list and the location catalog.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, anyhow, bail};
use edgeprobe_common::location::LocationCatalog;
use edgeprobe_common::network::range::{AddressRange, parse_range_list};
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::commands::RangeSource;

pub const CATALOG_URL: &str = "https://speed.cloudflare.com/locations";

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
    pub timeout: Duration,
}

impl RetryPolicy {
    pub const RANGE_LIST: Self = Self {
        attempts: 10,
        delay: Duration::from_secs(3),
        timeout: Duration::from_secs(3),
    };

    pub const CATALOG: Self = Self {
        attempts: 5,
        delay: Duration::from_secs(2),
        timeout: Duration::from_secs(3),
    };
}

pub async fn load_ranges(source: &RangeSource) -> anyhow::Result<Vec<AddressRange>> {
    match source {
        RangeSource::Url(url) => fetch_ranges(url, RetryPolicy::RANGE_LIST).await,
        RangeSource::File(path) => read_ranges(path),
    }
}

pub fn read_ranges(path: &Path) -> anyhow::Result<Vec<AddressRange>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read range list {}", path.display()))?;

    let ranges = parse_range_list(&text);
    if ranges.is_empty() {
        bail!("{} holds no valid range", path.display());
    }
    Ok(ranges)
}

pub async fn fetch_ranges(url: &str, policy: RetryPolicy) -> anyhow::Result<Vec<AddressRange>> {
    let client = &http_client(policy.timeout)?;

    with_retries("range list", policy, || async move {
        let ranges = parse_range_list(&fetch_text(client, url).await?);
        if ranges.is_empty() {
            bail!("response holds no valid range");
        }
        Ok(ranges)
    })
    .await
}

pub async fn fetch_catalog(url: &str, policy: RetryPolicy) -> anyhow::Result<LocationCatalog> {
    let client = &http_client(policy.timeout)?;

    with_retries("location catalog", policy, || async move {
        let body = fetch_text(client, url).await?;
        if body.trim().is_empty() {
            bail!("empty response body");
        }
        Ok(LocationCatalog::from_json(&body)?)
    })
    .await
}

fn http_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .danger_accept_invalid_certs(true)
        .pool_max_idle_per_host(0)
        .build()
        .context("Could not build HTTP client")
}

async fn fetch_text(client: &reqwest::Client, url: &str) -> anyhow::Result<String> {
    let response = client.get(url).send().await?;

    let status = response.status();
    if status != StatusCode::OK {
        bail!("unexpected status {status}");
    }
    Ok(response.text().await?)
}

async fn with_retries<T, F, Fut>(what: &str, policy: RetryPolicy, mut attempt: F) -> anyhow::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let mut last_error = None;

    for n in 1..=policy.attempts {
        if n > 1 {
            tokio::time::sleep(policy.delay).await;
            debug!("Retrying {what} ({n}/{})", policy.attempts);
        }

        match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!("Fetching {what} failed: {e:#}");
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| anyhow!("no attempt was made")))
        .with_context(|| format!("Giving up on the {what} after {} attempts", policy.attempts))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
