//! # Edgeprobe Core
//!
//! The probing pipeline, leaf-first:
//!
//! * [`partition`]: split input ranges into bounded [`AddressUnit`]s.
//! * [`sampler`]: draw representative addresses from every unit.
//! * [`scheduler`]: bounded worker pool with throttled progress.
//! * [`admission`]: the run-wide token pool capping outbound network operations.
//! * [`prober`]: sequential connect trials reduced to latency and loss.
//! * [`resolver`] and [`cache`]: serving-location lookup memoized per unit.
//! * [`aggregate`] and [`rank`]: per-unit summaries, filtering and ordering.
//! * [`iplist`]: address list generation for downstream tools.
//!
//! [`pipeline`] wires the stages together. Network access sits behind the
//! [`prober::Dialer`] and [`resolver::LocationProbe`] traits; the concrete
//! transports live in [`network`].
//!
//! [`AddressUnit`]: edgeprobe_common::network::unit::AddressUnit

pub mod admission;
pub mod aggregate;
pub mod cache;
pub mod iplist;
pub mod network;
pub mod partition;
pub mod pipeline;
pub mod prober;
pub mod rank;
pub mod resolver;
pub mod sampler;
pub mod scheduler;
