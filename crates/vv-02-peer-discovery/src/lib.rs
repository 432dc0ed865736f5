//! # Peer Discovery
//!
//! Keeps the [`PeerRegistry`](vv_01_peer_registry::PeerRegistry) current.
//!
//! Every few minutes the loop trims the blacklist, checks that peers can
//! reach us, fetches the channel's peer table (from the discovery service
//! or a static list), and replaces the known-good set. A blacklisted peer
//! only returns when its lease in the new table is strictly newer than the
//! one it was blacklisted with. Failures are logged and the loop keeps
//! going with the peers it already has.
//!
//! ## Architecture
//!
//! - **Domain Layer:** `DiscoveryConfig`, `StaticPeerList`, `DiscoveryStatus`
//! - **Ports Layer:** `DiscoveryService`, `LocalInterfaces`
//! - **Service Layer:** `DiscoveryLoop`
//! - **Adapters Layer:** `HttpDiscoveryClient`, `SystemInterfaces`

// =============================================================================
// CORE MODULES
// =============================================================================

pub mod adapters;
pub mod domain;
pub mod host;
pub mod ports;
pub mod service;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use adapters::{HttpDiscoveryClient, SystemInterfaces};
pub use domain::{
    ConfigError, DiscoveryConfig, DiscoveryError, DiscoveryStatus, StaticPeer, StaticPeerList,
    StatusSnapshot, BEHIND_NAT_MESSAGE, SERVICE_UNREACHABLE_MESSAGE,
};
pub use host::{resolve_host_address, HostAddress};
pub use ports::{DiscoveryService, LocalInterfaces, PeerListing, Registration};
pub use service::{DiscoveryLoop, PeerSource, RefreshOutcome};
