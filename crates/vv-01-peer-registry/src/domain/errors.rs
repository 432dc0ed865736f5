//! Domain errors for the peer registry.

use std::net::IpAddr;
use thiserror::Error;

/// Errors returned by registry queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// `pick_random` was called with an empty known-good set.
    #[error("no known-good peers")]
    NoKnownPeers,
}

/// Why an inbound sender was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AdmissionError {
    /// The sender is on the blacklist.
    #[error("peer {0} is blacklisted")]
    Blacklisted(IpAddr),

    /// The sender is not a known-good peer.
    #[error("peer {0} is not a known peer")]
    Unknown(IpAddr),

    /// The sender delivered within the receive-throttle window.
    #[error("peer {0} is sending too often")]
    Throttled(IpAddr),
}

/// Registry configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid registry config: {0}")]
    Invalid(String),
}
