//! Teleport configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::errors::ConfigError;

/// Port every peer listens on.
pub const DEFAULT_PEER_PORT: u16 = 50000;

/// Timeout of each outbound handshake request.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Largest package upload accepted.
pub const DEFAULT_MAX_PACKAGE_BYTES: usize = 4 * 1024 * 1024;

/// Largest organism state frame accepted.
pub const DEFAULT_MAX_STATE_BYTES: u64 = 1024 * 1024;

/// Teleport configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeleportConfig {
    /// Port peers are contacted on. Also the local listen port.
    pub peer_port: u16,
    pub request_timeout_secs: u64,
    pub max_package_bytes: usize,
    pub max_state_bytes: u64,
    /// Where received packages are installed.
    pub package_dir: PathBuf,
    /// Locale stamped on outgoing organisms.
    pub country: String,
    pub region: String,
}

impl Default for TeleportConfig {
    fn default() -> Self {
        Self {
            peer_port: DEFAULT_PEER_PORT,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_package_bytes: DEFAULT_MAX_PACKAGE_BYTES,
            max_state_bytes: DEFAULT_MAX_STATE_BYTES,
            package_dir: PathBuf::from("packages"),
            country: String::new(),
            region: String::new(),
        }
    }
}

impl TeleportConfig {
    /// Short timeouts, small limits.
    pub fn for_testing() -> Self {
        Self {
            request_timeout_secs: 5,
            max_package_bytes: 64 * 1024,
            max_state_bytes: 64 * 1024,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.peer_port == 0 {
            return Err(ConfigError::Invalid("peer_port cannot be 0".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs cannot be 0".into(),
            ));
        }
        if self.max_package_bytes == 0 || self.max_state_bytes == 0 {
            return Err(ConfigError::Invalid("size limits cannot be 0".into()));
        }
        if self.package_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("package_dir is required".into()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Request body limit: the larger of the two payload limits.
    pub fn body_limit(&self) -> usize {
        let state = usize::try_from(self.max_state_bytes).unwrap_or(usize::MAX);
        self.max_package_bytes.max(state)
    }
}
