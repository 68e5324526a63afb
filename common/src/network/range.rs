//! # Address Ranges
//!
//! Parsing and arithmetic for the network prefixes that make up the input
//! address space. An [`AddressRange`] is always stored in canonical form: the
//! address part is the masked network address of the prefix.
//!
//! Input lines may be:
//! * CIDR notation (e.g., `198.51.100.0/22`, `2001:db8::/32`).
//! * A bare address, which becomes a single-host range (`/32` or `/128`).
//! * Blank or starting with `#`, which is ignored by [`parse_range_list`].

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use pnet::ipnetwork::IpNetwork;
use tracing::debug;

use crate::error::RangeError;

pub const IPV4_BITS: u8 = 32;
pub const IPV6_BITS: u8 = 128;

/// A network prefix of either address family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AddressRange {
    network: IpAddr,
    prefix: u8,
}

impl AddressRange {
    /// Builds a range from any address inside it; host bits are cleared.
    pub fn new(addr: IpAddr, prefix: u8) -> Result<Self, RangeError> {
        let network = IpNetwork::new(addr, prefix).map_err(|_| RangeError::PrefixOutOfBounds {
            prefix,
            family: family_name(&addr),
        })?;

        Ok(Self {
            network: network.network(),
            prefix: network.prefix(),
        })
    }

    pub fn network(&self) -> IpAddr {
        self.network
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    pub fn is_ipv4(&self) -> bool {
        self.network.is_ipv4()
    }

    /// Address width of the family: 32 or 128.
    pub fn family_bits(&self) -> u8 {
        match self.network {
            IpAddr::V4(_) => IPV4_BITS,
            IpAddr::V6(_) => IPV6_BITS,
        }
    }

    pub fn host_bits(&self) -> u8 {
        self.family_bits() - self.prefix
    }

    /// Number of addresses covered, saturating at `u128::MAX` for `::/0`.
    pub fn size(&self) -> u128 {
        1u128.checked_shl(self.host_bits() as u32).unwrap_or(u128::MAX)
    }

    pub fn contains(&self, addr: IpAddr) -> bool {
        match (self.network, addr) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => {
                let mask = ipv4_mask(self.prefix);
                u32::from(ip) & mask == u32::from(net)
            }
            (IpAddr::V6(net), IpAddr::V6(ip)) => {
                let mask = ipv6_mask(self.prefix);
                u128::from(ip) & mask == u128::from(net)
            }
            _ => false,
        }
    }

    /// Last address of the range.
    pub fn last(&self) -> IpAddr {
        match self.network {
            IpAddr::V4(net) => IpAddr::V4(Ipv4Addr::from(u32::from(net) | !ipv4_mask(self.prefix))),
            IpAddr::V6(net) => {
                IpAddr::V6(Ipv6Addr::from(u128::from(net) | !ipv6_mask(self.prefix)))
            }
        }
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

impl FromStr for AddressRange {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(RangeError::Empty);
        }

        let (addr_str, prefix_str) = match s.split_once('/') {
            Some((addr, prefix)) => (addr.trim(), Some(prefix.trim())),
            None => (s, None),
        };

        let addr = addr_str
            .parse::<IpAddr>()
            .map_err(|_| RangeError::InvalidAddress(addr_str.to_string()))?;

        let prefix = match prefix_str {
            Some(p) => p
                .parse::<u8>()
                .map_err(|_| RangeError::InvalidPrefix(p.to_string()))?,
            None if addr.is_ipv4() => IPV4_BITS,
            None => IPV6_BITS,
        };

        Self::new(addr, prefix)
    }
}

/// Parses a newline separated range list, skipping blanks, comments and malformed lines.
pub fn parse_range_list(text: &str) -> Vec<AddressRange> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| match line.parse::<AddressRange>() {
            Ok(range) => Some(range),
            Err(e) => {
                debug!("Skipping range '{line}': {e}");
                None
            }
        })
        .collect()
}

pub fn ipv4_mask(prefix: u8) -> u32 {
    u32::MAX.checked_shl((IPV4_BITS - prefix) as u32).unwrap_or(0)
}

pub fn ipv6_mask(prefix: u8) -> u128 {
    u128::MAX.checked_shl((IPV6_BITS - prefix) as u32).unwrap_or(0)
}

fn family_name(addr: &IpAddr) -> &'static str {
    match addr {
        IpAddr::V4(_) => "IPv4",
        IpAddr::V6(_) => "IPv6",
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

    #[test]
    fn from_str_masks_host_bits() {
        let range: AddressRange = "172.16.5.10/20".parse().unwrap();
        assert_eq!(range.network(), IpAddr::V4(Ipv4Addr::new(172, 16, 0, 0)));
        assert_eq!(range.prefix(), 20);
        assert_eq!(range.last(), IpAddr::V4(Ipv4Addr::new(172, 16, 15, 255)));
        assert_eq!(range.to_string(), "172.16.0.0/20");
    }

    #[test]
    fn bare_addresses_become_single_hosts() {
        let v4: AddressRange = "203.0.113.7".parse().unwrap();
        assert_eq!(v4.prefix(), 32);
        assert_eq!(v4.size(), 1);

        let v6: AddressRange = "2001:db8::1".parse().unwrap();
        assert_eq!(v6.prefix(), 128);
        assert_eq!(v6.host_bits(), 0);
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!("".parse::<AddressRange>(), Err(RangeError::Empty));
        assert!(matches!(
            "999.1.2.3/24".parse::<AddressRange>(),
            Err(RangeError::InvalidAddress(_))
        ));
        assert!(matches!(
            "10.0.0.0/abc".parse::<AddressRange>(),
            Err(RangeError::InvalidPrefix(_))
        ));
        assert!(matches!(
            "10.0.0.0/33".parse::<AddressRange>(),
            Err(RangeError::PrefixOutOfBounds { prefix: 33, .. })
        ));
        assert!("2001:db8::/129".parse::<AddressRange>().is_err());
    }

    #[test]
    fn size_saturates_for_the_whole_v6_space() {
        let all: AddressRange = "::/0".parse().unwrap();
        assert_eq!(all.size(), u128::MAX);
        let half: AddressRange = "0.0.0.0/1".parse().unwrap();
        assert_eq!(half.size(), 1 << 31);
    }

    #[test]
    fn contains_respects_family_and_prefix() {
        let range: AddressRange = "2001:db8:1::/48".parse().unwrap();
        assert!(range.contains("2001:db8:1:ffff::1".parse().unwrap()));
        assert!(!range.contains("2001:db8:2::1".parse().unwrap()));
        assert!(!range.contains("10.0.0.1".parse().unwrap()));
    }

    #[test]
    fn parse_range_list_skips_noise() {
        let text = "# provider ranges\n\n198.51.100.0/24\n  203.0.113.9  \nnot-a-range\n2001:db8::/32\n";
        let ranges = parse_range_list(text);
        let rendered: Vec<String> = ranges.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec!["198.51.100.0/24", "203.0.113.9/32", "2001:db8::/32"]
        );
    }

    #[test]
    fn masks_handle_edges() {
        assert_eq!(ipv4_mask(0), 0);
        assert_eq!(ipv4_mask(32), u32::MAX);
        assert_eq!(ipv4_mask(24), 0xFFFF_FF00);
        assert_eq!(ipv6_mask(0), 0);
        assert_eq!(ipv6_mask(128), u128::MAX);
    }
}
