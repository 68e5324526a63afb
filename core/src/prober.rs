//! Latency and loss measurement for a single address.

use std::io;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use async_trait::async_trait;

/// Opens, and immediately closes, one connection to `target`.
#[async_trait]
pub trait Dialer: Send + Sync {
    async fn dial(&self, target: SocketAddr, timeout: Duration) -> io::Result<()>;
}

/// Reduction of `trials` sequential connect attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyStats {
    pub trials: u32,
    pub successes: u32,
    /// Mean over successful attempts only, truncated to whole milliseconds.
    pub avg_latency_ms: u32,
}

impl LatencyStats {
    /// `(trials - successes) / trials`.
    pub fn loss_rate(&self) -> f64 {
        f64::from(self.trials - self.successes) / f64::from(self.trials)
    }

    /// Builds stats from per-attempt outcomes; `None` when nothing succeeded.
    pub fn from_attempts(trials: u32, latencies: &[Duration]) -> Option<Self> {
        let successes = latencies.len() as u32;
        if successes == 0 || trials == 0 {
            return None;
        }

        let total: Duration = latencies.iter().sum();
        let avg = total / successes;

        Some(Self {
            trials,
            successes: successes.min(trials),
            avg_latency_ms: avg.as_millis().min(u32::MAX as u128) as u32,
        })
    }
}

/// Dials `target` `trials` times, one attempt after another.
///
/// Each attempt is bounded by `timeout`; the measured latency runs from the
/// start of the dial until the connection is established.
pub async fn measure_latency(
    dialer: &dyn Dialer,
    target: SocketAddr,
    trials: u32,
    timeout: Duration,
) -> Option<LatencyStats> {
    let mut latencies: Vec<Duration> = Vec::with_capacity(trials as usize);

    for _ in 0..trials {
        let start = Instant::now();
        if dialer.dial(target, timeout).await.is_ok() {
            latencies.push(start.elapsed());
        }
    }

    LatencyStats::from_attempts(trials, &latencies)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
