use std::borrow::Cow;
use std::fmt::Write as _;
use std::net::IpAddr;
use std::path::Path;

use anyhow::Context;
use edgeprobe_common::results::UnitSummary;

pub const CSV_HEADER: [&str; 6] = ["range", "location", "region", "city", "latency_ms", "loss_pct"];

/// Quotes `field` when it holds a delimiter, a quote or a line break.
pub fn csv_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

pub fn render_csv(results: &[UnitSummary]) -> String {
    let mut out = CSV_HEADER.join(",");
    out.push('\n');

    for summary in results {
        let range = summary.unit.to_string();
        let loss = format!("{:.1}", summary.loss_rate * 100.0);
        let latency = summary.latency_ms.to_string();
        let row = [
            range.as_str(),
            summary.location_id(),
            summary.region(),
            summary.city(),
            latency.as_str(),
            loss.as_str(),
        ];

        let line: Vec<Cow<'_, str>> = row.iter().map(|field| csv_field(field)).collect();
        let _ = writeln!(out, "{}", line.join(","));
    }

    out
}

pub fn write_csv(path: &Path, results: &[UnitSummary]) -> anyhow::Result<()> {
    std::fs::write(path, render_csv(results))
        .with_context(|| format!("Could not write result table {}", path.display()))
}

pub fn render_address_list(addresses: &[IpAddr]) -> String {
    addresses.iter().fold(String::new(), |mut out, addr| {
        let _ = writeln!(out, "{addr}");
        out
    })
}

pub fn write_address_list(path: &Path, addresses: &[IpAddr]) -> anyhow::Result<()> {
    std::fs::write(path, render_address_list(addresses))
        .with_context(|| format!("Could not write address list {}", path.display()))
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
    use edgeprobe_common::network::unit::AddressUnit;

    fn summary(range: &str, location: Option<Location>, latency_ms: u32, loss_rate: f64) -> UnitSummary {
        UnitSummary {
            unit: AddressUnit::new(range.parse().unwrap()).unwrap(),
            latency_ms,
            loss_rate,
            location,
            samples: 2,
        }
    }

    #[test]
    fn fields_are_quoted_only_when_needed() {
        assert_eq!(csv_field("Hong Kong"), "Hong Kong");
        assert_eq!(csv_field("Washington, DC"), "\"Washington, DC\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn table_has_header_and_one_decimal_loss() {
        let dc = Location {
            id: "IAD".into(),
            region: "North America".into(),
            city: "Washington, DC".into(),
        };
        let rows = [
            summary("198.51.100.0/24", Some(dc), 42, 0.125),
            summary("2001:db8:1::/48", None, 7, 0.0),
        ];

        let csv = render_csv(&rows);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "range,location,region,city,latency_ms,loss_pct");
        assert_eq!(lines[1], "198.51.100.0/24,IAD,North America,\"Washington, DC\",42,12.5");
        assert_eq!(lines[2], "2001:db8:1::/48,Unknown,,,7,0.0");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn address_list_is_one_per_line() {
        let addrs: Vec<IpAddr> = vec!["198.51.100.1".parse().unwrap(), "2001:db8::1".parse().unwrap()];
        assert_eq!(render_address_list(&addrs), "198.51.100.1\n2001:db8::1\n");
        assert_eq!(render_address_list(&[]), "");
    }

    #[test]
    fn csv_lands_on_disk() {
        let path = std::env::temp_dir().join(format!("edgeprobe-results-{}.csv", std::process::id()));
        write_csv(&path, &[summary("198.51.100.0/24", Some(Location::bare("HKG")), 30, 0.25)]).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(written.ends_with("198.51.100.0/24,HKG,,,30,25.0\n"));
    }
}
