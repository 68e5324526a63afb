//! Draws pseudo-random representative addresses from each unit.
//!
//! The network prefix of a unit is always preserved bit for bit; only host
//! bits are randomized. The all-zero host (the unit's network address) is
//! avoided whenever the unit has room for anything else.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use edgeprobe_common::network::range::{ipv4_mask, ipv6_mask};
use edgeprobe_common::network::unit::AddressUnit;
use rand::Rng;
use rayon::prelude::*;

/// A unit together with the addresses drawn from it, in draw order.
#[derive(Debug, Clone)]
pub struct SampledUnit {
    pub unit: AddressUnit,
    pub addresses: Vec<IpAddr>,
}

/// Samples `per_unit` addresses from every unit in parallel.
///
/// Units that produced no address are left out of the returned list.
pub fn sample_units(units: &[AddressUnit], per_unit: usize) -> Vec<SampledUnit> {
    units
        .par_iter()
        .map(|unit| {
            let mut rng = rand::rng();
            SampledUnit {
                unit: *unit,
                addresses: (0..per_unit)
                    .map(|_| sample_address(unit, &mut rng))
                    .collect(),
            }
        })
        .filter(|sampled| !sampled.addresses.is_empty())
        .collect()
}

/// Draws one address from `unit`.
pub fn sample_address<R: Rng + ?Sized>(unit: &AddressUnit, rng: &mut R) -> IpAddr {
    match unit.network() {
        IpAddr::V4(network) => IpAddr::V4(sample_ipv4(network, unit.prefix(), rng)),
        IpAddr::V6(network) => IpAddr::V6(sample_ipv6(network, unit.prefix(), rng)),
    }
}

fn sample_ipv4<R: Rng + ?Sized>(network: Ipv4Addr, prefix: u8, rng: &mut R) -> Ipv4Addr {
    let host_bits = 32 - prefix;
    let base = u32::from(network) & ipv4_mask(prefix);

    let offset: u32 = match host_bits {
        0 => 0,
        // Point-to-point: both addresses are usable.
        1 => rng.random_range(0..2),
        _ => {
            let span: u64 = 1 << host_bits;
            rng.random_range(1..span) as u32
        }
    };

    Ipv4Addr::from(base | offset)
}

fn sample_ipv6<R: Rng + ?Sized>(network: Ipv6Addr, prefix: u8, rng: &mut R) -> Ipv6Addr {
    let mask = ipv6_mask(prefix);
    let base = u128::from(network) & mask;

    let mut host = rng.random::<u128>() & !mask;
    if host == 0 && prefix < 128 {
        host = 1;
    }

    Ipv6Addr::from(base | host)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
