//! JSON documents exchanged over the peer HTTP surface.

use serde::{Deserialize, Serialize};
use shared_types::{Channel, ProtocolVersion};
use std::collections::BTreeMap;
use uuid::Uuid;
use vv_01_peer_registry::RegistryReport;
use vv_02_peer_discovery::StatusSnapshot;

use super::metrics::MetricsSnapshot;

/// Header carrying the full package name on uploads.
pub const PACKAGE_NAME_HEADER: &str = "x-package-name";

/// Header carrying the sender's channel on state uploads.
pub const PEER_CHANNEL_HEADER: &str = "x-peer-channel";

/// `GET /version`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub major: u32,
    pub minor: u32,
    pub build: u32,
    pub channel: Channel,
}

impl VersionInfo {
    pub fn new(version: ProtocolVersion, channel: Channel) -> Self {
        Self {
            major: version.major,
            minor: version.minor,
            build: version.build,
            channel,
        }
    }

    pub fn version(&self) -> ProtocolVersion {
        ProtocolVersion::new(self.major, self.minor, self.build)
    }
}

/// `POST /organisms/assemblycheck`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageCheck {
    pub exists: bool,
}

/// `POST /organisms/assemblies`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSaved {
    pub saved: bool,
}

/// `POST /organisms/state`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateReply {
    #[serde(rename_all = "camelCase")]
    Accepted { assembly_received: bool },
    Rejected { arrived: bool, reason: String },
}

impl StateReply {
    pub fn rejected(reason: impl Into<String>) -> Self {
        StateReply::Rejected {
            arrived: false,
            reason: reason.into(),
        }
    }
}

/// Peer section of the stats document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerStats {
    pub known_good: usize,
    pub blacklisted: usize,
    pub on_channel: u32,
    pub status: String,
    pub last_refresh: Option<String>,
}

impl PeerStats {
    pub fn new(report: RegistryReport, discovery: StatusSnapshot) -> Self {
        Self {
            known_good: report.known_good,
            blacklisted: report.blacklisted,
            on_channel: discovery.peers_on_channel,
            status: discovery.message,
            last_refresh: discovery.last_refresh.map(|t| t.to_rfc3339()),
        }
    }
}

/// Runtime section of the stats document.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeStats {
    pub workers: usize,
    pub alive_tasks: usize,
}

impl RuntimeStats {
    pub fn current() -> Self {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let metrics = handle.metrics();
                Self {
                    workers: metrics.num_workers(),
                    alive_tasks: metrics.num_alive_tasks(),
                }
            }
            Err(_) => Self::default(),
        }
    }
}

/// `GET /organisms/stats`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsDocument {
    pub world_id: Uuid,
    pub version: String,
    pub channel: Channel,
    pub migrations: MetricsSnapshot,
    pub peers: PeerStats,
    pub population: BTreeMap<String, u64>,
    pub blacklisted_packages: Vec<String>,
    pub runtime: RuntimeStats,
}
