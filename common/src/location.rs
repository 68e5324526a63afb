//! # Edge Locations
//!
//! The provider publishes a catalog of its serving locations, keyed by a short
//! location code (an airport-style identifier such as `HKG`). Probes only
//! ever learn the code; region and city come from this catalog.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use crate::error::CatalogError;

/// Label used wherever a location could not be determined.
pub const UNKNOWN_LOCATION: &str = "Unknown";

/// One entry of the provider's location catalog.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LocationRecord {
    #[serde(rename = "iata")]
    pub id: String,
    #[serde(rename = "lat", default)]
    pub latitude: f64,
    #[serde(rename = "lon", default)]
    pub longitude: f64,
    #[serde(rename = "cca2", default, deserialize_with = "null_as_empty")]
    pub country: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub region: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub city: String,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A resolved serving location as attached to measurements.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub id: String,
    pub region: String,
    pub city: String,
}

impl Location {
    /// A location known only by its code.
    pub fn bare(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            region: String::new(),
            city: String::new(),
        }
    }
}

impl From<&LocationRecord> for Location {
    fn from(record: &LocationRecord) -> Self {
        Self {
            id: record.id.clone(),
            region: record.region.clone(),
            city: record.city.clone(),
        }
    }
}

/// Read-only lookup table from location code to catalog record.
#[derive(Debug, Clone, Default)]
pub struct LocationCatalog {
    records: HashMap<String, LocationRecord>,
}

impl LocationCatalog {
    pub fn from_records(records: impl IntoIterator<Item = LocationRecord>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|record| (record.id.clone(), record))
                .collect(),
        }
    }

    /// Decodes the catalog's JSON array form.
    ///
    /// Entries that do not decode are skipped. A payload that is not an array,
    /// or that holds no usable entry, is an error.
    pub fn from_json(payload: &str) -> Result<Self, CatalogError> {
        let entries: Vec<Value> = serde_json::from_str(payload)?;
        let records: Vec<LocationRecord> = entries
            .into_iter()
            .enumerate()
            .filter_map(|(idx, entry)| match LocationRecord::deserialize(entry) {
                Ok(record) => Some(record),
                Err(e) => {
                    debug!("Skipping catalog entry #{idx}: {e}");
                    None
                }
            })
            .collect();
        if records.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(Self::from_records(records))
    }

    pub fn get(&self, id: &str) -> Option<&LocationRecord> {
        self.records.get(id)
    }

    /// Expands a location code into a [`Location`], keeping the bare code on a catalog miss.
    pub fn locate(&self, id: &str) -> Location {
        self.get(id).map(Location::from).unwrap_or_else(|| Location::bare(id))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
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
