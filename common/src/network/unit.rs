//! # Address Units
//!
//! A unit is the atomic sampling and caching key of a run: a range whose
//! prefix is at least as long as the family cap (`/24` for IPv4, `/48` for
//! IPv6). Units are only ever created from ranges that already satisfy the cap.

use std::fmt;
use std::net::IpAddr;

use super::range::AddressRange;

pub const IPV4_UNIT_PREFIX: u8 = 24;
pub const IPV6_UNIT_PREFIX: u8 = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AddressUnit(AddressRange);

impl AddressUnit {
    /// Wraps `range` if it is at or finer than its family cap.
    pub fn new(range: AddressRange) -> Option<Self> {
        (range.prefix() >= unit_prefix_for(&range)).then_some(Self(range))
    }

    pub fn range(&self) -> &AddressRange {
        &self.0
    }

    pub fn network(&self) -> IpAddr {
        self.0.network()
    }

    pub fn prefix(&self) -> u8 {
        self.0.prefix()
    }

    pub fn host_bits(&self) -> u8 {
        self.0.host_bits()
    }

    pub fn is_ipv4(&self) -> bool {
        self.0.is_ipv4()
    }

    pub fn contains(&self, addr: IpAddr) -> bool {
        self.0.contains(addr)
    }

    /// Number of distinct addresses the sampler can draw from this unit.
    ///
    /// The network address is never drawn once the host part is wider than
    /// one bit, and IPv6 never yields an all-zero host.
    pub fn sampleable(&self) -> u128 {
        let size = self.0.size();
        match (self.is_ipv4(), self.host_bits()) {
            (_, 0) => 1,
            (true, 1) => 2,
            _ => size - 1,
        }
    }
}

impl fmt::Display for AddressUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Granularity cap for the family of `range`.
pub fn unit_prefix_for(range: &AddressRange) -> u8 {
    if range.is_ipv4() {
        IPV4_UNIT_PREFIX
    } else {
        IPV6_UNIT_PREFIX
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
