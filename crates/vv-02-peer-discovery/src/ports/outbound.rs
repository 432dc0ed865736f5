//! # Outbound Ports
//!
//! The two operations consumed from the discovery backend, and the local
//! interface lookup used to decide reachability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared_types::{Channel, ProtocolVersion};
use std::net::IpAddr;
use uuid::Uuid;
use vv_01_peer_registry::PeerLease;

use crate::domain::DiscoveryError;

/// Who we are, as announced on every registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub version: ProtocolVersion,
    pub channel: Channel,
    pub world_id: Uuid,
}

/// Peer table returned by a registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerListing {
    /// Total peers registered on the channel, including ourselves.
    pub peers_on_channel: u32,
    #[serde(default)]
    pub peers: Vec<PeerLease>,
}

/// Central discovery backend.
#[async_trait]
pub trait DiscoveryService: Send + Sync {
    /// The address the service sees this instance connect from.
    async fn validate_address(&self) -> Result<IpAddr, DiscoveryError>;

    /// Register ourselves on the channel and fetch its peers.
    async fn register_and_list(
        &self,
        registration: &Registration,
    ) -> Result<PeerListing, DiscoveryError>;
}

/// Addresses bound to this host's network interfaces.
pub trait LocalInterfaces: Send + Sync {
    fn addresses(&self) -> Vec<IpAddr>;
}
