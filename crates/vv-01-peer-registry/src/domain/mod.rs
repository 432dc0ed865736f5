//! Domain Layer - Pure peer bookkeeping with no I/O
//!
//! - `Peer` / `PeerLease`: a remote instance and how long it is current
//! - `PeerTable`: the known-good map and the bounded blacklist
//! - `RegistryConfig`: bounds, throttle window and trust modes

pub mod config;
pub mod errors;
pub mod peer;
pub mod peer_table;

pub use config::*;
pub use errors::*;
pub use peer::*;
pub use peer_table::*;
