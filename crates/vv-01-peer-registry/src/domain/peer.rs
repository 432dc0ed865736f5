//! Peer entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// A peer address paired with the lease asserted by discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerLease {
    pub address: IpAddr,
    pub lease: DateTime<Utc>,
}

impl PeerLease {
    pub fn new(address: IpAddr, lease: DateTime<Utc>) -> Self {
        Self { address, lease }
    }
}

/// A remote instance tracked by the registry.
///
/// `address` is the identity. `last_receipt` is `None` until the peer has
/// delivered an organism to us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    pub address: IpAddr,
    pub lease: DateTime<Utc>,
    pub last_receipt: Option<DateTime<Utc>>,
}

impl Peer {
    pub fn new(address: IpAddr, lease: DateTime<Utc>) -> Self {
        Self {
            address,
            lease,
            last_receipt: None,
        }
    }
}

impl From<PeerLease> for Peer {
    fn from(value: PeerLease) -> Self {
        Self::new(value.address, value.lease)
    }
}

/// A receive window claimed by [`PeerRegistry::admit`].
///
/// If the delivery turns out to be unusable, hand the claim back through
/// [`PeerRegistry::release_claim`] and the sender's previous receipt time
/// is restored.
///
/// [`PeerRegistry::admit`]: crate::PeerRegistry::admit
/// [`PeerRegistry::release_claim`]: crate::PeerRegistry::release_claim
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptClaim {
    pub address: IpAddr,
    /// Receipt time before the claim.
    pub previous: Option<DateTime<Utc>>,
    /// Receipt time written by the claim.
    pub stamped: DateTime<Utc>,
}

/// Counts reported by the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryReport {
    pub known_good: usize,
    pub blacklisted: usize,
}
