//! Splits arbitrary input ranges into sampling units.
//!
//! Ranges already at or finer than the family cap pass through unchanged.
//! Coarser IPv4 ranges are enumerated exhaustively into `/24`s. Coarser IPv6
//! ranges are split into `/48`s, but at most `2^16` of them per input range:
//! anything coarser than `/32` is only partially covered (the first `2^16`
//! units in address order). That limit bounds memory for ranges such as a
//! provider's `/29`, which would otherwise fan out into half a million units.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use edgeprobe_common::network::range::AddressRange;
use edgeprobe_common::network::unit::{
    AddressUnit, IPV4_UNIT_PREFIX, IPV6_UNIT_PREFIX, unit_prefix_for,
};
use tracing::debug;

/// Maximum number of prefix bits an IPv6 range is split by.
pub const IPV6_MAX_SPLIT_BITS: u8 = 16;

/// Partitions every range and concatenates the resulting units.
pub fn partition(ranges: &[AddressRange]) -> Vec<AddressUnit> {
    ranges.iter().flat_map(split_range).collect()
}

/// Splits a single range into units of at most the family cap.
pub fn split_range(range: &AddressRange) -> Vec<AddressUnit> {
    if let Some(unit) = AddressUnit::new(*range) {
        return vec![unit];
    }

    let split_bits = unit_prefix_for(range) - range.prefix();
    match range.network() {
        IpAddr::V4(network) => split_ipv4(network, split_bits),
        IpAddr::V6(network) => {
            if split_bits > IPV6_MAX_SPLIT_BITS {
                debug!(
                    "{range} would split into 2^{split_bits} units, keeping the first 2^{IPV6_MAX_SPLIT_BITS}"
                );
            }
            split_ipv6(network, split_bits.min(IPV6_MAX_SPLIT_BITS))
        }
    }
}

fn split_ipv4(network: Ipv4Addr, split_bits: u8) -> Vec<AddressUnit> {
    let base: u32 = network.into();
    let step_bits = 32 - IPV4_UNIT_PREFIX;

    (0..1u32 << split_bits)
        .filter_map(|i| {
            let addr = Ipv4Addr::from(base | (i << step_bits));
            to_unit(IpAddr::V4(addr), IPV4_UNIT_PREFIX)
        })
        .collect()
}

fn split_ipv6(network: Ipv6Addr, split_bits: u8) -> Vec<AddressUnit> {
    let base: u128 = network.into();
    let step_bits = 128 - IPV6_UNIT_PREFIX;

    (0..1u128 << split_bits)
        .filter_map(|i| {
            let addr = Ipv6Addr::from(base | (i << step_bits));
            to_unit(IpAddr::V6(addr), IPV6_UNIT_PREFIX)
        })
        .collect()
}

fn to_unit(addr: IpAddr, prefix: u8) -> Option<AddressUnit> {
    AddressRange::new(addr, prefix).ok().and_then(AddressUnit::new)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
