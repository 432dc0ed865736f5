//! Static peer lists.
//!
//! Written as `channel,ip,channel,ip,...`. An entry whose channel is `all`
//! applies to every channel.

use chrono::{DateTime, Duration, Utc};
use shared_types::{Channel, ANY_CHANNEL};
use std::net::IpAddr;
use vv_01_peer_registry::PeerLease;

use super::errors::DiscoveryError;

/// One `(channel, ip)` pair from a static list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticPeer {
    pub channel: String,
    pub address: IpAddr,
}

impl StaticPeer {
    pub fn serves(&self, channel: &Channel) -> bool {
        self.channel.eq_ignore_ascii_case(ANY_CHANNEL) || channel.matches(&self.channel)
    }
}

/// Parsed static peer list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticPeerList {
    entries: Vec<StaticPeer>,
}

impl StaticPeerList {
    /// Parse `channel,ip,...`. Blank input is an empty list.
    ///
    /// Every entry is checked, not only those for the local channel: a bad
    /// address anywhere in the list is an error.
    pub fn parse(raw: &str) -> Result<Self, DiscoveryError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }

        let fields: Vec<&str> = raw.split(',').map(str::trim).collect();
        if fields.len() % 2 != 0 {
            return Err(DiscoveryError::MalformedStaticList(format!(
                "expected channel,ip pairs, found {} fields",
                fields.len()
            )));
        }

        let mut entries = Vec::with_capacity(fields.len() / 2);
        for pair in fields.chunks_exact(2) {
            let (channel, address) = (pair[0], pair[1]);
            if channel.is_empty() {
                return Err(DiscoveryError::MalformedStaticList(
                    "empty channel name".into(),
                ));
            }
            let address: IpAddr = address.parse().map_err(|_| {
                DiscoveryError::MalformedStaticList(format!("bad address {address:?}"))
            })?;
            if address.is_unspecified() {
                return Err(DiscoveryError::UnspecifiedStaticPeer);
            }
            entries.push(StaticPeer {
                channel: channel.to_string(),
                address,
            });
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[StaticPeer] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Peers serving `channel`, each leased until `now + lease`.
    pub fn leases(&self, channel: &Channel, now: DateTime<Utc>, lease: Duration) -> Vec<PeerLease> {
        self.entries
            .iter()
            .filter(|peer| peer.serves(channel))
            .map(|peer| PeerLease::new(peer.address, now + lease))
            .collect()
    }
}
