//! Serving-location resolution for addresses that answered the latency stage.
//!
//! The cache is consulted first; on a miss one admission token is taken and
//! the out-of-band probe is attempted once plus `retries` more times. A
//! probe that keeps failing classifies the address as unknown, which is a
//! normal outcome rather than an error.

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use edgeprobe_common::location::{Location, LocationCatalog};
use edgeprobe_common::network::unit::AddressUnit;
use tracing::{debug, trace};

use crate::admission::AdmissionPool;
use crate::cache::LocationCache;

/// Asks an address which location serves it.
#[async_trait]
pub trait LocationProbe: Send + Sync {
    /// Returns the raw marker value, or `None` when the response carried no marker.
    async fn probe(&self, addr: IpAddr) -> anyhow::Result<Option<String>>;

    /// Called once no further attempts will be made against `addr`.
    fn release(&self, _addr: IpAddr) {}
}

/// How a resolution ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Served from the per-unit cache without network I/O.
    Cached(Location),
    Probed(Location),
    Unknown,
}

impl Resolution {
    pub fn location(self) -> Option<Location> {
        match self {
            Resolution::Cached(location) | Resolution::Probed(location) => Some(location),
            Resolution::Unknown => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, Resolution::Unknown)
    }
}

/// Extracts the location code: everything after the last `-` of the marker.
pub fn parse_location_id(marker: &str) -> Option<&str> {
    let (_, id) = marker.trim().rsplit_once('-')?;
    (!id.is_empty()).then_some(id)
}

pub struct LocationResolver {
    probe: Arc<dyn LocationProbe>,
    catalog: Arc<LocationCatalog>,
    cache: Arc<LocationCache>,
    pool: AdmissionPool,
    retries: u32,
}

impl LocationResolver {
    pub fn new(
        probe: Arc<dyn LocationProbe>,
        catalog: Arc<LocationCatalog>,
        cache: Arc<LocationCache>,
        pool: AdmissionPool,
        retries: u32,
    ) -> Self {
        Self {
            probe,
            catalog,
            cache,
            pool,
            retries,
        }
    }

    pub fn cache(&self) -> &LocationCache {
        &self.cache
    }

    /// Resolves the location serving `addr`, memoized per `unit`.
    pub async fn resolve(&self, unit: &AddressUnit, addr: IpAddr) -> Resolution {
        if let Some(location) = self.cache.get(unit) {
            trace!("{addr}: cache hit for {unit}");
            return Resolution::Cached(location);
        }

        let Ok(_token) = self.pool.acquire().await else {
            return Resolution::Unknown;
        };

        let probed = self.probe_with_retries(addr).await;
        self.probe.release(addr);

        match probed {
            Some(location) => {
                self.cache.insert(*unit, location.clone());
                Resolution::Probed(location)
            }
            None => Resolution::Unknown,
        }
    }

    async fn probe_with_retries(&self, addr: IpAddr) -> Option<Location> {
        for attempt in 0..=self.retries {
            match self.probe.probe(addr).await {
                Ok(Some(marker)) => match parse_location_id(&marker) {
                    Some(id) => return Some(self.catalog.locate(id)),
                    None => trace!("{addr}: marker '{marker}' carries no location code"),
                },
                Ok(None) => trace!("{addr}: response without marker (attempt {attempt})"),
                Err(e) => trace!("{addr}: probe failed (attempt {attempt}): {e}"),
            }
        }

        debug!("{addr}: location unknown after {} attempts", self.retries + 1);
        None
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
