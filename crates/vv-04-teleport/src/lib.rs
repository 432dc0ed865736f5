//! # Teleport
//!
//! Moves organisms between peer instances of the simulation.
//!
//! ## Outbound
//!
//! [`MigrationCoordinator`] picks a random known-good peer. If there is
//! none, or the pick is this host, the organism stays local. Otherwise a
//! background task runs [`MigrationClient`] through the handshake:
//!
//! ```text
//! QueryVersion -> CheckCompatibility -> CheckPackagePresence
//!     -> UploadPackageIfAbsent -> UploadEntityState -> Success
//! ```
//!
//! Any failure puts the organism back into the local simulation, so it is
//! never lost and never in two places. Failures other than a peer's
//! explicit refusal demote the peer in the registry.
//!
//! ## Inbound
//!
//! [`MigrationRequestHandler`] serves the peer HTTP surface. Organism
//! state is accepted only from a known-good, non-blacklisted sender on our
//! channel, at most once per throttle window, and only after the payload
//! decodes through the allow-list guard.
//!
//! ## Architecture
//!
//! - **Domain Layer:** `TeleportConfig`, `Migrant`, `MigrationFailure`, `MigrationMetrics`
//! - **Ports Layer:** `PackageCache`, `LocalEngine`, `PeerTransport`
//! - **Service Layer:** `MigrationClient`, `MigrationCoordinator`
//! - **Adapters Layer:** `FsPackageCache`, `HttpPeerTransport`, `InMemoryEngine`
//! - **HTTP:** `MigrationRequestHandler`

// =============================================================================
// CORE MODULES
// =============================================================================

pub mod adapters;
pub mod domain;
pub mod handler;
pub mod ports;
pub mod service;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use adapters::{FsPackageCache, HttpPeerTransport, InMemoryEngine, DEFAULT_AWAITING_CAPACITY};
pub use domain::{
    CacheError, ConfigError, Delivery, InboundRejection, MetricsSnapshot, Migrant,
    MigrationFailure, MigrationMetrics, MigrationOutcome, MigrationReport, MigrationStep,
    NodeIdentity, PackageCheck, PackageSaved, StateReply, StatsDocument, TeleportConfig,
    TransportError, VersionInfo, DEFAULT_PEER_PORT, PACKAGE_NAME_HEADER, PEER_CHANNEL_HEADER,
};
pub use handler::MigrationRequestHandler;
pub use ports::{LocalEngine, PackageCache, PeerTransport};
pub use service::{Dispatch, MigrationClient, MigrationCoordinator};
