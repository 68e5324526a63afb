//! Per-unit memo of resolved locations.
//!
//! Reads take the shared lock, inserts and compaction take the exclusive one.
//! Only resolved locations are stored; an unknown outcome is never cached.

use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock};

use edgeprobe_common::location::Location;
use edgeprobe_common::network::unit::AddressUnit;
use tracing::debug;

#[derive(Debug, Default)]
pub struct LocationCache {
    entries: RwLock<HashMap<AddressUnit, Location>>,
}

impl LocationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, unit: &AddressUnit) -> Option<Location> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(unit).cloned()
    }

    pub fn insert(&self, unit: AddressUnit, location: Location) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(unit, location);
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rebuilds the map from `live` units once it holds more than twice as many entries.
    ///
    /// Returns whether a compaction happened.
    pub fn compact(&self, live: &HashSet<AddressUnit>) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.len() <= live.len() * 2 {
            return false;
        }

        let before = entries.len();
        let kept: HashMap<AddressUnit, Location> = live
            .iter()
            .filter_map(|unit| entries.get(unit).map(|location| (*unit, location.clone())))
            .collect();
        *entries = kept;

        debug!("Location cache compacted from {before} to {} entries", entries.len());
        true
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
    use std::net::{IpAddr, Ipv4Addr};

    fn unit(third_octet: u8) -> AddressUnit {
        let addr = IpAddr::V4(Ipv4Addr::new(198, 51, third_octet, 0));
        AddressUnit::new(
            edgeprobe_common::network::range::AddressRange::new(addr, 24).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn get_returns_inserted_location() {
        let cache = LocationCache::new();
        assert!(cache.get(&unit(1)).is_none());

        cache.insert(unit(1), Location::bare("HKG"));
        assert_eq!(cache.get(&unit(1)), Some(Location::bare("HKG")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn compaction_waits_for_twice_the_live_size() {
        let cache = LocationCache::new();
        for octet in 0..4 {
            cache.insert(unit(octet), Location::bare("NRT"));
        }

        let live: HashSet<AddressUnit> = [unit(0), unit(1)].into_iter().collect();
        assert!(!cache.compact(&live));
        assert_eq!(cache.len(), 4);
    }

    #[test]
    fn compaction_keeps_only_live_units() {
        let cache = LocationCache::new();
        for octet in 0..10 {
            cache.insert(unit(octet), Location::bare("LAX"));
        }

        let live: HashSet<AddressUnit> = [unit(2), unit(7), unit(200)].into_iter().collect();
        assert!(cache.compact(&live));
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&unit(2)).is_some());
        assert!(cache.get(&unit(7)).is_some());
        assert!(cache.get(&unit(3)).is_none());
    }
}
