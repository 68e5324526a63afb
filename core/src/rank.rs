//! User predicates and the total order of the final result set.

use std::cmp::Ordering;

use edgeprobe_common::config::FilterConfig;
use edgeprobe_common::results::UnitSummary;

/// Whether `summary` survives every predicate of `filter`.
pub fn passes(summary: &UnitSummary, filter: &FilterConfig) -> bool {
    if summary.is_unknown() && !filter.show_all {
        return false;
    }

    if !filter.locations.is_empty()
        && !filter.locations.iter().any(|id| id == summary.location_id())
    {
        return false;
    }

    if summary.latency_ms < filter.min_latency_ms || summary.latency_ms > filter.max_latency_ms {
        return false;
    }

    summary.loss_rate <= filter.max_loss_rate
}

/// Ascending loss rate, ties broken by ascending latency.
pub fn compare(a: &UnitSummary, b: &UnitSummary) -> Ordering {
    a.loss_rate
        .total_cmp(&b.loss_rate)
        .then(a.latency_ms.cmp(&b.latency_ms))
}

/// Filters, sorts and truncates `summaries`.
pub fn filter_and_rank(summaries: Vec<UnitSummary>, filter: &FilterConfig) -> Vec<UnitSummary> {
    let mut ranked: Vec<UnitSummary> = summaries
        .into_iter()
        .filter(|summary| passes(summary, filter))
        .collect();

    ranked.sort_by(compare);

    if let Some(limit) = filter.limit {
        ranked.truncate(limit);
    }
    ranked
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
