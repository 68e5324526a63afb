//! Run settings handed from the command line to the probing core.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Upper bound on worker slots and admission tokens.
pub const MAX_CONCURRENCY: usize = 1024;

/// Settings of the two probing stages.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Sequential connect attempts per sampled address.
    pub trials: u32,
    pub port: u16,
    pub samples_per_unit: usize,
    /// Worker slots, also the size of the shared admission pool.
    pub concurrency: usize,
    pub connect_timeout: Duration,
    pub resolve_timeout: Duration,
    /// Extra location probe attempts after the first one fails.
    pub resolve_retries: u32,
}

impl ProbeConfig {
    /// Clamps concurrency into `1..=MAX_CONCURRENCY`.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, MAX_CONCURRENCY);
        self
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            trials: 4,
            port: 443,
            samples_per_unit: 2,
            concurrency: 128,
            connect_timeout: Duration::from_secs(1),
            resolve_timeout: Duration::from_secs(1),
            resolve_retries: 5,
        }
    }
}

/// Predicates and truncation applied to the per-unit summaries.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    pub min_latency_ms: u32,
    pub max_latency_ms: u32,
    pub max_loss_rate: f64,
    /// Location codes to keep; empty keeps every location.
    pub locations: Vec<String>,
    /// Keep units whose location stayed unknown.
    pub show_all: bool,
    /// Keep only the first `n` ranked results.
    pub limit: Option<usize>,
}

impl FilterConfig {
    /// Parses a comma separated location allow-list such as `HKG, NRT,LAX`.
    pub fn parse_locations(list: &str) -> Vec<String> {
        list.split(',')
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(String::from)
            .collect()
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_latency_ms: 0,
            max_latency_ms: 500,
            max_loss_rate: 0.5,
            locations: Vec::new(),
            show_all: false,
            limit: None,
        }
    }
}

/// How many addresses of one family to write to the address list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
    /// Every address of every unit, up to the per-family cap.
    All,
    /// This many distinct sampled addresses.
    Count(usize),
}

impl FromStr for ListMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        match s.parse::<usize>() {
            Ok(count) if count > 0 => Ok(Self::Count(count)),
            _ => Err(format!("expected 'all' or a positive count, got '{s}'")),
        }
    }
}

/// Result count requested on the command line: `all` or a positive number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultLimit(pub Option<usize>);

impl FromStr for ResultLimit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match ListMode::from_str(s)? {
            ListMode::All => Ok(Self(None)),
            ListMode::Count(count) => Ok(Self(Some(count))),
        }
    }
}

/// Default file the address list is written to.
pub const DEFAULT_ADDRESS_LIST: &str = "ip.txt";

#[derive(Debug, Clone)]
pub struct AddressListConfig {
    pub ipv4: Option<ListMode>,
    pub ipv6: Option<ListMode>,
    pub path: PathBuf,
}

impl AddressListConfig {
    pub fn is_requested(&self) -> bool {
        self.ipv4.is_some() || self.ipv6.is_some()
    }
}

impl Default for AddressListConfig {
    fn default() -> Self {
        Self {
            ipv4: None,
            ipv6: None,
            path: PathBuf::from(DEFAULT_ADDRESS_LIST),
        }
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
