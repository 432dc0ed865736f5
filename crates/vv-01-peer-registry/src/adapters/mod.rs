//! Adapters for the registry's outbound ports.

pub mod time;

pub use time::SystemTimeSource;
