pub mod generate;
pub mod probe;

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::bail;
use clap::Parser;
use edgeprobe_common::config::{
    AddressListConfig, FilterConfig, ListMode, MAX_CONCURRENCY, ProbeConfig, ResultLimit,
};
use tokio::time::error::Elapsed;
use tracing::warn;

/// Wall-clock budget for a whole run.
pub const RUN_DEADLINE: Duration = Duration::from_secs(2 * 60 * 60);

/// Drives `run` to completion, or drops it once `deadline` has passed.
pub async fn run_with_deadline<F: Future>(deadline: Duration, run: F) -> Result<F::Output, Elapsed> {
    tokio::time::timeout(deadline, run).await
}

#[derive(Parser, Debug)]
#[command(name = "edgeprobe")]
#[command(version, about = "Finds the fastest anycast edge ranges reachable from this host.")]
pub struct CommandLine {
    /// URL of the range list to probe
    #[arg(long)]
    pub url: Option<String>,

    /// File holding the range list, used when --url is absent
    #[arg(short = 'f', long)]
    pub file: Option<PathBuf>,

    /// Connect attempts per sampled address
    #[arg(short = 't', long, default_value_t = 4)]
    pub trials: u32,

    /// Port dialed by the latency probe
    #[arg(long, default_value_t = 443)]
    pub port: u16,

    /// Addresses sampled from every unit
    #[arg(long, default_value_t = 2)]
    pub samples: usize,

    /// Concurrent probes, at most 1024
    #[arg(short = 'n', long, default_value_t = 128)]
    pub concurrency: usize,

    /// Keep only these locations, comma separated (e.g. HKG,NRT,LAX)
    #[arg(long)]
    pub colo: Option<String>,

    /// Latency ceiling in milliseconds
    #[arg(long, default_value_t = 500)]
    pub max_latency: u32,

    /// Latency floor in milliseconds
    #[arg(long, default_value_t = 0)]
    pub min_latency: u32,

    /// Loss rate ceiling, between 0 and 1
    #[arg(long, default_value_t = 0.5)]
    pub max_loss: f64,

    /// Number of ranked results to keep: 'all' or a count
    #[arg(short = 'p', long = "print", default_value = "all")]
    pub print: ResultLimit,

    /// Result table file
    #[arg(short = 'o', long, default_value = "IP_Speed.csv")]
    pub output: PathBuf,

    /// Skip writing the result table
    #[arg(long)]
    pub no_csv: bool,

    /// Write IPv4 addresses to the address list: 'all' or a count
    #[arg(long)]
    pub ipv4: Option<ListMode>,

    /// Write this many IPv6 addresses to the address list
    #[arg(long)]
    pub ipv6: Option<ListMode>,

    /// Address list file
    #[arg(long, default_value = "ip.txt")]
    pub ip_file: PathBuf,

    /// Skip probing and only write the address list
    #[arg(long)]
    pub no_test: bool,

    /// Keep results whose location could not be resolved
    #[arg(long)]
    pub show_all: bool,
}

/// Where the range list comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeSource {
    Url(String),
    File(PathBuf),
}

/// Validated run settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub source: RangeSource,
    pub probe: ProbeConfig,
    pub filter: FilterConfig,
    pub list: AddressListConfig,
    /// `None` when the result table is disabled.
    pub csv: Option<PathBuf>,
    pub no_test: bool,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn into_settings(self) -> anyhow::Result<Settings> {
        let source = match (self.url, self.file) {
            (Some(url), _) => RangeSource::Url(url),
            (None, Some(file)) => RangeSource::File(file),
            (None, None) => bail!("Either --url or --file must be given"),
        };

        let list = AddressListConfig {
            ipv4: self.ipv4,
            ipv6: self.ipv6,
            path: self.ip_file,
        };
        if self.no_test && !list.is_requested() {
            bail!("--no-test needs --ipv4 or --ipv6");
        }

        if self.trials == 0 {
            bail!("--trials must be at least 1");
        }
        if self.samples == 0 {
            bail!("--samples must be at least 1");
        }

        if self.concurrency > MAX_CONCURRENCY {
            warn!("Concurrency lowered from {} to {MAX_CONCURRENCY}", self.concurrency);
        }
        let probe = ProbeConfig {
            trials: self.trials,
            port: self.port,
            samples_per_unit: self.samples,
            ..ProbeConfig::default()
        }
        .with_concurrency(self.concurrency);

        let filter = FilterConfig {
            min_latency_ms: self.min_latency,
            max_latency_ms: self.max_latency,
            max_loss_rate: self.max_loss,
            locations: self
                .colo
                .as_deref()
                .map(FilterConfig::parse_locations)
                .unwrap_or_default(),
            show_all: self.show_all,
            limit: self.print.0,
        };

        Ok(Settings {
            source,
            probe,
            filter,
            list,
            csv: (!self.no_csv).then_some(self.output),
            no_test: self.no_test,
        })
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
