//! Ports Layer - discovery service and local interface lookup

pub mod outbound;

pub use outbound::*;
