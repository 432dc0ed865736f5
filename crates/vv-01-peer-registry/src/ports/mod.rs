//! # Ports Layer
//!
//! The registry drives exactly one outbound port: the clock.

pub mod outbound;

pub use outbound::TimeSource;
