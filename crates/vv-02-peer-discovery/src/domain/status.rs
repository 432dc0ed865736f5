//! Last known discovery status, shared with the stats endpoint.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

/// Shown while the address the discovery service sees is not one of ours.
pub const BEHIND_NAT_MESSAGE: &str = "This instance appears to be behind a NAT or firewall. \
     Other peers cannot reach it; forward the listen port and set assume_reachable.";

/// Shown while the discovery service cannot be contacted.
pub const SERVICE_UNREACHABLE_MESSAGE: &str =
    "Unable to contact the discovery service. No organisms will arrive from other peers.";

/// Copy of the current status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    /// Operator-facing warning, empty when healthy.
    pub message: String,
    /// Peers the last refresh reported on our channel, self included.
    pub peers_on_channel: u32,
    pub last_refresh: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
pub struct DiscoveryStatus {
    inner: RwLock<StatusSnapshot>,
}

impl DiscoveryStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.inner.read().clone()
    }

    pub fn set_message(&self, message: impl Into<String>) {
        self.inner.write().message = message.into();
    }

    pub fn record_refresh(&self, peers_on_channel: u32, at: DateTime<Utc>) {
        let mut inner = self.inner.write();
        inner.message.clear();
        inner.peers_on_channel = peers_on_channel;
        inner.last_refresh = Some(at);
    }
}
