//! Folds per-address results into one summary per unit.
//!
//! Results are grouped in the order they are given, which the pipeline keeps
//! equal to the order addresses were sampled. The unit's location is the
//! first result in that order whose location resolved.

use std::collections::HashMap;

use edgeprobe_common::network::unit::AddressUnit;
use edgeprobe_common::results::{ProbeResult, UnitSummary};

/// Summarizes `results` per unit; units without any result do not appear.
pub fn summarize(results: &[ProbeResult]) -> Vec<UnitSummary> {
    let mut order: Vec<AddressUnit> = Vec::new();
    let mut groups: HashMap<AddressUnit, Vec<&ProbeResult>> = HashMap::new();

    for result in results {
        groups
            .entry(result.unit)
            .or_insert_with(|| {
                order.push(result.unit);
                Vec::new()
            })
            .push(result);
    }

    order
        .into_iter()
        .filter_map(|unit| groups.remove(&unit).map(|group| summarize_unit(unit, &group)))
        .collect()
}

fn summarize_unit(unit: AddressUnit, group: &[&ProbeResult]) -> UnitSummary {
    let samples = group.len();
    let latency_sum: u64 = group.iter().map(|r| u64::from(r.latency_ms)).sum();
    let loss_sum: f64 = group.iter().map(|r| r.loss_rate).sum();

    UnitSummary {
        unit,
        latency_ms: (latency_sum / samples as u64) as u32,
        loss_rate: loss_sum / samples as f64,
        location: group.iter().find_map(|r| r.location.clone()),
        samples,
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

#[cfg(test)]
mod tests {
    use super::*;
    use edgeprobe_common::location::Location;

    fn unit(s: &str) -> AddressUnit {
        AddressUnit::new(s.parse().unwrap()).unwrap()
    }

    fn result(unit: AddressUnit, host: &str, latency_ms: u32, loss_rate: f64, loc: Option<&str>) -> ProbeResult {
        ProbeResult {
            addr: host.parse().unwrap(),
            unit,
            latency_ms,
            loss_rate,
            location: loc.map(Location::bare),
        }
    }

    #[test]
    fn latency_mean_truncates_and_loss_mean_is_float() {
        let u = unit("198.51.100.0/24");
        let results = vec![
            result(u, "198.51.100.1", 10, 0.0, Some("HKG")),
            result(u, "198.51.100.2", 15, 0.25, Some("HKG")),
        ];

        let summaries = summarize(&results);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].latency_ms, 12);
        assert_eq!(summaries[0].loss_rate, 0.125);
        assert_eq!(summaries[0].samples, 2);
    }

    #[test]
    fn first_resolved_location_in_result_order_wins() {
        let u = unit("198.51.100.0/24");
        let results = vec![
            result(u, "198.51.100.1", 10, 0.0, None),
            result(u, "198.51.100.2", 10, 0.0, Some("NRT")),
            result(u, "198.51.100.3", 10, 0.0, Some("HKG")),
        ];

        let summaries = summarize(&results);
        assert_eq!(summaries[0].location_id(), "NRT");
    }

    #[test]
    fn unresolved_units_stay_unknown() {
        let u = unit("198.51.100.0/24");
        let results = vec![result(u, "198.51.100.1", 10, 0.0, None)];
        let summaries = summarize(&results);
        assert!(summaries[0].is_unknown());
        assert_eq!(summaries[0].location_id(), "Unknown");
    }

    #[test]
    fn groups_keep_first_appearance_order() {
        let a = unit("198.51.100.0/24");
        let b = unit("203.0.113.0/24");
        let results = vec![
            result(b, "203.0.113.1", 40, 0.0, None),
            result(a, "198.51.100.1", 20, 0.0, None),
            result(b, "203.0.113.2", 60, 0.5, None),
        ];

        let summaries = summarize(&results);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].unit, b);
        assert_eq!(summaries[0].latency_ms, 50);
        assert_eq!(summaries[0].loss_rate, 0.25);
        assert_eq!(summaries[1].unit, a);
    }

    #[test]
    fn no_results_no_summaries() {
        assert!(summarize(&[]).is_empty());
    }
}
