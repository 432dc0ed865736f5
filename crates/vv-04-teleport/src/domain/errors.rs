//! Migration errors.
//!
//! Outbound failures end a handshake and send the organism home. Inbound
//! rejections are answered with a fixed reason string; internal error text
//! never reaches the peer.

use shared_types::{Channel, ProtocolVersion};
use std::path::PathBuf;
use thiserror::Error;
use vv_01_peer_registry::AdmissionError;

/// Why an outbound migration did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MigrationFailure {
    #[error("peer unreachable: {0}")]
    Unreachable(String),

    #[error("peer did not answer in time")]
    Timeout,

    #[error("version mismatch: local {local}, remote {remote}")]
    VersionMismatch {
        local: ProtocolVersion,
        remote: ProtocolVersion,
    },

    #[error("channel mismatch: local {local}, remote {remote}")]
    ChannelMismatch { local: Channel, remote: Channel },

    /// The peer answered correctly but declined the organism.
    #[error("peer declined the organism: {reason}")]
    ProtocolAbort { reason: String },

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("package {0} is not available locally")]
    PackageUnavailable(String),
}

impl MigrationFailure {
    /// Every failure except an explicit decline blacklists the peer.
    pub fn demotes_peer(&self) -> bool {
        !matches!(self, MigrationFailure::ProtocolAbort { .. })
    }
}

/// Failure of a single request to a peer.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("peer answered with status {0}")]
    Status(u16),

    #[error("unreadable response: {0}")]
    Malformed(String),

    #[error("request failed: {0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else if let Some(status) = e.status() {
            TransportError::Status(status.as_u16())
        } else if e.is_decode() {
            TransportError::Malformed(e.to_string())
        } else {
            TransportError::Other(e.to_string())
        }
    }
}

impl From<TransportError> for MigrationFailure {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Timeout => MigrationFailure::Timeout,
            TransportError::Connect(detail) => MigrationFailure::Unreachable(detail),
            other => MigrationFailure::Transport(other.to_string()),
        }
    }
}

/// Why an inbound delivery was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InboundRejection {
    #[error("Peer channel mismatch")]
    ChannelMismatch,

    #[error("Sender did not pass the blacklist check")]
    BadPeer,

    #[error("Sender is delivering too often")]
    Throttled,

    #[error("Organism state could not be decoded")]
    Undecodable,
}

impl From<AdmissionError> for InboundRejection {
    fn from(e: AdmissionError) -> Self {
        match e {
            AdmissionError::Throttled(_) => InboundRejection::Throttled,
            AdmissionError::Blacklisted(_) | AdmissionError::Unknown(_) => {
                InboundRejection::BadPeer
            }
        }
    }
}

/// Package cache errors.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("package {0} not found")]
    NotFound(String),

    #[error("package {0} is blacklisted")]
    Blacklisted(String),

    #[error("refusing to install an empty package as {0}")]
    Empty(String),

    #[error("cache I/O failed at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Teleport configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid teleport configuration: {0}")]
    Invalid(String),
}
