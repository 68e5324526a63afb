use std::collections::BTreeMap;
use std::time::Duration;

use colored::*;
use edgeprobe_common::results::UnitSummary;
use edgeprobe_core::pipeline::RunReport;

use crate::terminal::{colors, print};

/// Ranked ranges listed after the per-location table.
pub const TOP_RESULTS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationStats {
    pub id: String,
    pub count: usize,
    pub max_latency_ms: u32,
    pub avg_latency_ms: u32,
    pub min_latency_ms: u32,
}

/// Latency spread per location, ordered by location code.
pub fn location_stats(results: &[UnitSummary]) -> Vec<LocationStats> {
    let mut grouped: BTreeMap<&str, Vec<u32>> = BTreeMap::new();
    for summary in results {
        grouped
            .entry(summary.location_id())
            .or_default()
            .push(summary.latency_ms);
    }

    grouped
        .into_iter()
        .map(|(id, latencies)| {
            let total: u64 = latencies.iter().map(|&l| u64::from(l)).sum();
            LocationStats {
                id: id.to_string(),
                count: latencies.len(),
                max_latency_ms: latencies.iter().copied().max().unwrap_or(0),
                avg_latency_ms: (total / latencies.len() as u64) as u32,
                min_latency_ms: latencies.iter().copied().min().unwrap_or(0),
            }
        })
        .collect()
}

pub fn print_run_report(report: &RunReport) {
    print::header("probe statistics");
    print::aligned_line("Units", report.units);
    print::aligned_line(
        "Latency",
        format!(
            "{}/{} answered ({:.1}%)",
            report.latency_ok,
            report.sampled,
            report.latency_success_rate() * 100.0
        ),
    );
    print::aligned_line(
        "Location",
        format!(
            "{}/{} resolved ({:.1}%), {} from cache",
            report.resolved,
            report.resolve_attempts,
            report.resolve_success_rate() * 100.0,
            report.cache_hits
        ),
    );
}

pub fn print_summary(results: &[UnitSummary], elapsed: Duration) {
    if results.is_empty() {
        print::no_results();
        return;
    }

    print::header("locations");
    for stats in location_stats(results) {
        print::aligned_line(
            &stats.id,
            format!(
                "{:>4} ranges  max {:>4}ms  avg {:>4}ms  min {:>4}ms",
                stats.count, stats.max_latency_ms, stats.avg_latency_ms, stats.min_latency_ms
            ),
        );
    }

    print::header(&format!("top {}", TOP_RESULTS.min(results.len())));
    for summary in results.iter().take(TOP_RESULTS) {
        let place = if summary.city().is_empty() {
            summary.location_id().to_string()
        } else {
            format!("{}({})", summary.city(), summary.location_id())
        };
        print::print_status(format!(
            "{} {} {} {}",
            format!("{:<20}", summary.unit.to_string()).color(colors::RANGE),
            format!("{place:<24}").color(colors::ACCENT),
            format!("{:>4}ms", summary.latency_ms).color(colors::LATENCY),
            format!("{:>5.1}%", summary.loss_rate * 100.0).color(colors::LOSS),
        ));
    }

    let found: ColoredString = format!("{} ranges", results.len()).bold().green();
    let took: ColoredString = format!("{:.2}s", elapsed.as_secs_f64()).bold().yellow();
    print::fat_separator();
    print::centerln(&format!("Probe complete: {found} kept in {took}"));
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
