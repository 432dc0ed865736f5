//! # Peer Registry
//!
//! Bookkeeping of the peers this instance may exchange organisms with.
//!
//! Two maps keyed by IP address: **known-good** peers (migration
//! destinations and accepted senders) and a bounded **blacklist** of peers
//! excluded after a failed or incompatible migration. A blacklisted peer
//! comes back only when discovery reports a strictly newer lease for it.
//!
//! ## Architecture
//!
//! - **Domain Layer:** `PeerTable` holds both maps; pure, clock-free logic
//! - **Ports Layer:** `TimeSource`
//! - **Service Layer:** `PeerRegistry`, one mutex over the table
//! - **Adapters Layer:** `SystemTimeSource`
//!
//! ## Example
//!
//! ```rust
//! use std::net::IpAddr;
//! use vv_01_peer_registry::{PeerLease, PeerRegistry, RegistryConfig, SystemTimeSource};
//!
//! let registry = PeerRegistry::new(RegistryConfig::default(), Box::new(SystemTimeSource::new()));
//! let sender: IpAddr = "192.168.1.20".parse().unwrap();
//! registry.replace_known_good([PeerLease::new(sender, chrono::Utc::now())]);
//!
//! // First delivery claims the throttle window, the second is refused.
//! assert!(registry.admit(&sender).is_ok());
//! assert!(registry.admit(&sender).is_err());
//! ```

// =============================================================================
// CORE MODULES
// =============================================================================

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

/// Test utilities (ControllableTimeSource).
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use adapters::SystemTimeSource;
pub use domain::{
    AdmissionError, ConfigError, Peer, PeerLease, PeerTable, ReceiptClaim, RegistryConfig,
    RegistryError, RegistryReport,
};
pub use ports::TimeSource;
pub use service::PeerRegistry;
