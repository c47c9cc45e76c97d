//! Capability traits injected into the domain.

pub mod clock_port;
pub mod config_port;
pub mod price_port;
