//! Service Layer - outbound handshake and migration dispatch

mod client;
mod coordinator;

pub use self::client::MigrationClient;
pub use self::coordinator::{Dispatch, MigrationCoordinator};
