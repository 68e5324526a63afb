//! Plain address lists drawn from units, one family at a time.

use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr};

use edgeprobe_common::config::ListMode;
use edgeprobe_common::network::unit::AddressUnit;
use rand::Rng;
use tracing::{debug, warn};

use crate::sampler::sample_address;

/// Most addresses written per family.
pub const FAMILY_CAP: usize = 1_000_000;

/// Random draws allowed per requested address before sampling gives up.
const DRAWS_PER_ADDRESS: usize = 64;

/// Builds the address list for the requested families: IPv4 first, then IPv6.
pub fn generate_address_list(
    units: &[AddressUnit],
    ipv4: Option<ListMode>,
    ipv6: Option<ListMode>,
) -> Vec<IpAddr> {
    generate_with_rng(units, ipv4, ipv6, &mut rand::rng())
}

pub fn generate_with_rng<R: Rng + ?Sized>(
    units: &[AddressUnit],
    ipv4: Option<ListMode>,
    ipv6: Option<ListMode>,
    rng: &mut R,
) -> Vec<IpAddr> {
    let (v4, v6): (Vec<AddressUnit>, Vec<AddressUnit>) =
        units.iter().copied().partition(AddressUnit::is_ipv4);

    let mut list = Vec::new();

    match ipv4 {
        Some(ListMode::All) => list.extend(enumerate_ipv4(&v4)),
        Some(ListMode::Count(n)) => {
            let selected = leading_units_covering(&v4, n.min(FAMILY_CAP));
            list.extend(sample_distinct(selected, n, rng));
        }
        None => {}
    }

    match ipv6 {
        Some(ListMode::All) => warn!("Listing every IPv6 address is not supported, give a count instead"),
        Some(ListMode::Count(n)) => list.extend(sample_distinct(&v6, n, rng)),
        None => {}
    }

    list
}

/// Every IPv4 address of every unit, in unit order, without duplicates.
fn enumerate_ipv4(units: &[AddressUnit]) -> Vec<IpAddr> {
    let mut seen: HashSet<Ipv4Addr> = HashSet::new();
    let mut out = Vec::new();

    for unit in units {
        let IpAddr::V4(network) = unit.network() else { continue };
        let first = u32::from(network);
        let count = unit.range().size() as u64;

        for offset in 0..count {
            if out.len() >= FAMILY_CAP {
                warn!("IPv4 address list stopped at {FAMILY_CAP} entries");
                return out;
            }
            let addr = Ipv4Addr::from(first.wrapping_add(offset as u32));
            if seen.insert(addr) {
                out.push(IpAddr::V4(addr));
            }
        }
    }

    out
}

/// Shortest prefix of `units` whose sampleable capacity reaches `target`.
fn leading_units_covering(units: &[AddressUnit], target: usize) -> &[AddressUnit] {
    let mut capacity: u128 = 0;
    for (idx, unit) in units.iter().enumerate() {
        capacity = capacity.saturating_add(unit.sampleable());
        if capacity >= target as u128 {
            return &units[..=idx];
        }
    }
    units
}

/// Round-robin draws from `units` until `requested` distinct addresses exist.
fn sample_distinct<R: Rng + ?Sized>(
    units: &[AddressUnit],
    requested: usize,
    rng: &mut R,
) -> Vec<IpAddr> {
    if units.is_empty() || requested == 0 {
        return Vec::new();
    }

    let capacity = units
        .iter()
        .fold(0u128, |acc, unit| acc.saturating_add(unit.sampleable()));
    let mut target = requested.min(FAMILY_CAP);
    if (target as u128) > capacity {
        warn!("Only {capacity} distinct addresses available, {target} were requested");
        target = capacity as usize;
    }

    let mut seen: HashSet<IpAddr> = HashSet::with_capacity(target);
    let mut out = Vec::with_capacity(target);
    let budget = target.saturating_mul(DRAWS_PER_ADDRESS).max(1024);

    for draw in 0..budget {
        if out.len() >= target {
            break;
        }
        let unit = &units[draw % units.len()];
        let addr = sample_address(unit, rng);
        if seen.insert(addr) {
            out.push(addr);
        }
    }

    if out.len() < target {
        warn!("Address list holds {} of {target} addresses after {budget} draws", out.len());
    } else {
        debug!("Sampled {} distinct addresses from {} units", out.len(), units.len());
    }
    out
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
