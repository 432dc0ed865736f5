//! # Node Runtime Library
//!
//! Exposes the node's wiring for the binary and for cross-crate tests.
//!
//! - `container/` - configuration and the shared subsystem container
//! - `runtime` - startup and shutdown of discovery, listener and emigration
//! - `emigration` - periodic departures from the local population

pub mod container;
pub mod emigration;
pub mod runtime;

pub use container::{ConfigError, NodeConfig, NodeContainer};
pub use emigration::EmigrationLoop;
pub use runtime::NodeRuntime;
