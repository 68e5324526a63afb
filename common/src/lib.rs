//! # Edgeprobe Common
//!
//! Shared vocabulary of the workspace: address ranges and sampling units,
//! per-address and per-unit measurement records, the location catalog, and
//! the plain value structs the binary hands to the probing core.

pub mod config;
pub mod error;
pub mod location;
pub mod network;
pub mod results;
