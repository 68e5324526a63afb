//! Measurement records produced by the probing pipeline.

use std::net::IpAddr;

use crate::location::{Location, UNKNOWN_LOCATION};
use crate::network::unit::AddressUnit;

/// Outcome for one sampled address that answered at least one trial.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub addr: IpAddr,
    pub unit: AddressUnit,
    /// Mean connect time over successful trials, truncated to whole milliseconds.
    pub latency_ms: u32,
    /// Fraction of failed trials, in `[0, 1]`.
    pub loss_rate: f64,
    /// `None` until resolved, and when resolution ended as unknown.
    pub location: Option<Location>,
}

/// Aggregate over every [`ProbeResult`] of one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitSummary {
    pub unit: AddressUnit,
    pub latency_ms: u32,
    pub loss_rate: f64,
    pub location: Option<Location>,
    /// How many probe results went into the averages.
    pub samples: usize,
}

impl UnitSummary {
    pub fn location_id(&self) -> &str {
        self.location
            .as_ref()
            .map(|location| location.id.as_str())
            .unwrap_or(UNKNOWN_LOCATION)
    }

    pub fn region(&self) -> &str {
        self.location.as_ref().map_or("", |location| location.region.as_str())
    }

    pub fn city(&self) -> &str {
        self.location.as_ref().map_or("", |location| location.city.as_str())
    }

    pub fn is_unknown(&self) -> bool {
        self.location.is_none()
    }
}
