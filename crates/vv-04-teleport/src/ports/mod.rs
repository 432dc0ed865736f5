//! Ports Layer - package cache, simulation engine and peer transport

pub mod outbound;

pub use outbound::*;
