//! Domain Layer - migration outcomes, failures, metrics and wire documents

pub mod config;
pub mod errors;
pub mod metrics;
pub mod migrant;
pub mod protocol;

pub use config::*;
pub use errors::*;
pub use metrics::*;
pub use migrant::*;
pub use protocol::*;
