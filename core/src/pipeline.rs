//! # Probing Pipeline
//!
//! Runs one measurement pass over a set of units:
//!
//! 1. **Sampling** draws representative addresses from every unit.
//! 2. **Latency** dials every sample and keeps the ones that answered.
//! 3. **Location** resolves the serving location of every survivor.
//! 4. **Aggregation** folds the survivors into one summary per unit.
//!
//! Each stage finishes completely before the next one starts. Network work
//! in both probing stages is gated by one shared [`AdmissionPool`].

use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::Context;
use edgeprobe_common::config::ProbeConfig;
use edgeprobe_common::location::LocationCatalog;
use edgeprobe_common::network::unit::AddressUnit;
use edgeprobe_common::results::{ProbeResult, UnitSummary};
use tracing::{debug, info};

use crate::admission::AdmissionPool;
use crate::aggregate::summarize;
use crate::cache::LocationCache;
use crate::network::http::HttpLocationProbe;
use crate::network::tcp::TcpDialer;
use crate::prober::{Dialer, measure_latency};
use crate::resolver::{LocationProbe, LocationResolver, Resolution};
use crate::sampler::sample_units;
use crate::scheduler::{NoProgress, ProgressSink, ProgressTracker, Stage, run_pool};

/// Counters collected over one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub units: usize,
    pub sampled: usize,
    pub latency_ok: usize,
    pub latency_failed: usize,
    pub resolve_attempts: usize,
    /// Includes cache hits.
    pub resolved: usize,
    pub cache_hits: usize,
    pub cache_before_compaction: usize,
    pub cache_after_compaction: usize,
}

impl RunReport {
    pub fn latency_success_rate(&self) -> f64 {
        ratio(self.latency_ok, self.sampled)
    }

    pub fn resolve_success_rate(&self) -> f64 {
        ratio(self.resolved, self.resolve_attempts)
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// One entry per unit with at least one answering sample, unfiltered.
    pub summaries: Vec<UnitSummary>,
    pub report: RunReport,
}

pub struct Pipeline {
    config: ProbeConfig,
    dialer: Arc<dyn Dialer>,
    probe: Arc<dyn LocationProbe>,
    catalog: Arc<LocationCatalog>,
    progress: Arc<dyn ProgressSink>,
    cache: Arc<LocationCache>,
    pool: AdmissionPool,
}

impl Pipeline {
    /// A pipeline dialing over TCP and resolving over HTTP.
    pub fn new(config: ProbeConfig, catalog: Arc<LocationCatalog>) -> Self {
        let probe = HttpLocationProbe::new(config.resolve_timeout);
        let pool = AdmissionPool::new(config.concurrency);

        Self {
            dialer: Arc::new(TcpDialer),
            probe: Arc::new(probe),
            catalog,
            progress: Arc::new(NoProgress),
            cache: Arc::new(LocationCache::new()),
            pool,
            config,
        }
    }

    pub fn with_dialer(mut self, dialer: Arc<dyn Dialer>) -> Self {
        self.dialer = dialer;
        self
    }

    pub fn with_location_probe(mut self, probe: Arc<dyn LocationProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn admission(&self) -> &AdmissionPool {
        &self.pool
    }

    pub fn cache(&self) -> &LocationCache {
        &self.cache
    }

    pub async fn run(&self, units: &[AddressUnit]) -> anyhow::Result<RunOutcome> {
        let mut report = RunReport {
            units: units.len(),
            ..RunReport::default()
        };

        let owned = units.to_vec();
        let per_unit = self.config.samples_per_unit;
        let sampled = tokio::task::spawn_blocking(move || sample_units(&owned, per_unit))
            .await
            .context("Sampling task failed")?;

        let targets: Vec<(AddressUnit, IpAddr)> = sampled
            .into_iter()
            .flat_map(|s| {
                let unit = s.unit;
                s.addresses.into_iter().map(move |addr| (unit, addr))
            })
            .collect();
        report.sampled = targets.len();
        info!("Sampled {} addresses from {} units", targets.len(), units.len());

        let answered = self.latency_stage(targets).await;
        report.latency_ok = answered.len();
        report.latency_failed = report.sampled - answered.len();

        report.resolve_attempts = answered.len();
        let (located, cache_hits) = self.location_stage(answered).await;
        report.cache_hits = cache_hits;
        report.resolved = located.iter().filter(|r| r.location.is_some()).count();

        let live: HashSet<AddressUnit> = located.iter().map(|r| r.unit).collect();
        report.cache_before_compaction = self.cache.len();
        self.cache.compact(&live);
        report.cache_after_compaction = self.cache.len();

        let summaries = summarize(&located);
        debug!("{} units produced a summary", summaries.len());

        Ok(RunOutcome { summaries, report })
    }

    async fn latency_stage(&self, targets: Vec<(AddressUnit, IpAddr)>) -> Vec<ProbeResult> {
        let tracker = Arc::new(ProgressTracker::new(
            Stage::Latency,
            targets.len(),
            self.progress.clone(),
        ));

        let dialer = self.dialer.clone();
        let pool = self.pool.clone();
        let port = self.config.port;
        let trials = self.config.trials;
        let timeout = self.config.connect_timeout;

        let outputs = run_pool(targets, self.config.concurrency, tracker.clone(), move |(unit, addr)| {
            let dialer = dialer.clone();
            let pool = pool.clone();
            async move {
                let Ok(_token) = pool.acquire().await else {
                    return None;
                };
                probe_latency(dialer.as_ref(), unit, addr, port, trials, timeout).await
            }
        })
        .await;

        tracker.finish();
        outputs.into_iter().flatten().collect()
    }

    async fn location_stage(&self, answered: Vec<ProbeResult>) -> (Vec<ProbeResult>, usize) {
        let tracker = Arc::new(ProgressTracker::new(
            Stage::Location,
            answered.len(),
            self.progress.clone(),
        ));

        let resolver = Arc::new(LocationResolver::new(
            self.probe.clone(),
            self.catalog.clone(),
            self.cache.clone(),
            self.pool.clone(),
            self.config.resolve_retries,
        ));
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        let located = run_pool(answered, self.config.concurrency, tracker.clone(), move |mut result: ProbeResult| {
            let resolver = resolver.clone();
            let counter = counter.clone();
            async move {
                let resolution = resolver.resolve(&result.unit, result.addr).await;
                if matches!(resolution, Resolution::Cached(_)) {
                    counter.fetch_add(1, Ordering::Relaxed);
                }
                result.location = resolution.location();
                result
            }
        })
        .await;

        tracker.finish();
        (located, hits.load(Ordering::Relaxed))
    }
}

/// Measures one sample; `None` when every trial failed.
async fn probe_latency(
    dialer: &dyn Dialer,
    unit: AddressUnit,
    addr: IpAddr,
    port: u16,
    trials: u32,
    timeout: Duration,
) -> Option<ProbeResult> {
    let stats = measure_latency(dialer, SocketAddr::new(addr, port), trials, timeout).await?;
    Some(ProbeResult {
        addr,
        unit,
        latency_ms: stats.avg_latency_ms,
        loss_rate: stats.loss_rate(),
        location: None,
    })
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
