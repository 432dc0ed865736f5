//! Discovery errors.

use thiserror::Error;

/// Failures of one discovery refresh. None of them stop the loop.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("discovery request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("discovery service unavailable: {0}")]
    Unavailable(String),

    #[error("discovery service returned an unusable response: {0}")]
    InvalidResponse(String),

    #[error("malformed static peer list: {0}")]
    MalformedStaticList(String),

    #[error("static peer list contains 0.0.0.0")]
    UnspecifiedStaticPeer,
}

/// Discovery configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid discovery configuration: {0}")]
    Invalid(String),
}
