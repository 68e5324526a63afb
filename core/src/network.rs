//! Concrete transports behind the probing traits.

pub mod http;
pub mod tcp;
