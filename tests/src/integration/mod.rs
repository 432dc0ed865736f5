//! Cross-crate scenarios over real HTTP.

pub mod harness;
pub mod migration_flows;
pub mod node_runtime;
