//! # Protocol Identity
//!
//! Version triple and channel name. Together they decide whether two peers
//! may exchange organisms.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Channel joined when none is configured.
pub const DEFAULT_CHANNEL: &str = "EcoSystem";

/// Wildcard accepted in static peer lists.
pub const ANY_CHANNEL: &str = "all";

/// `major.minor.build` of the running peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ProtocolVersion {
    pub major: u32,
    pub minor: u32,
    pub build: u32,
}

impl ProtocolVersion {
    pub const fn new(major: u32, minor: u32, build: u32) -> Self {
        Self {
            major,
            minor,
            build,
        }
    }

    /// Version of this build, taken from the package manifest.
    pub fn current() -> Self {
        Self {
            major: env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or_default(),
            minor: env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or_default(),
            build: env!("CARGO_PKG_VERSION_PATCH").parse().unwrap_or_default(),
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.build)
    }
}

/// A named partition of the peer network.
///
/// Comparison ignores ASCII case: `EcoSystem` and `ECOSYSTEM` are the same
/// channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Channel(String);

impl Channel {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if `name` designates this channel.
    pub fn matches(&self, name: &str) -> bool {
        self.0.eq_ignore_ascii_case(name.trim())
    }
}

impl Default for Channel {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL)
    }
}

impl PartialEq for Channel {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.0)
    }
}

impl Eq for Channel {}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
