//! Registry configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::errors::ConfigError;

/// Default blacklist bound.
pub const DEFAULT_MAX_BLACKLIST: usize = 30;

/// Default receive-throttle window in seconds.
pub const DEFAULT_RECEIVE_THROTTLE_SECS: u64 = 30;

/// Lease extension applied when a peer is demoted.
pub const DEFAULT_DEMOTION_PENALTY_SECS: u64 = 3600;

/// Ceiling for every configured window.
pub const MAX_WINDOW_SECS: u64 = 365 * 24 * 3600;

/// Peer registry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Maximum blacklist entries kept after truncation.
    pub max_blacklist: usize,
    /// Minimum seconds between two accepted deliveries from one peer.
    pub receive_throttle_secs: u64,
    /// Seconds added to a peer's lease when it is demoted.
    pub demotion_penalty_secs: u64,
    /// Demo trust mode: nobody is blacklisted, nobody is throttled.
    pub demo_mode: bool,
    /// Peers come from a static list and are never demoted.
    pub static_discovery: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_blacklist: DEFAULT_MAX_BLACKLIST,
            receive_throttle_secs: DEFAULT_RECEIVE_THROTTLE_SECS,
            demotion_penalty_secs: DEFAULT_DEMOTION_PENALTY_SECS,
            demo_mode: false,
            static_discovery: false,
        }
    }
}

impl RegistryConfig {
    /// Small bound so truncation is easy to exercise.
    pub fn for_testing() -> Self {
        Self {
            max_blacklist: 3,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_blacklist == 0 {
            return Err(ConfigError::Invalid("max_blacklist cannot be 0".into()));
        }
        if self.receive_throttle_secs > MAX_WINDOW_SECS {
            return Err(ConfigError::Invalid(
                "receive_throttle_secs exceeds one year".into(),
            ));
        }
        if self.demotion_penalty_secs > MAX_WINDOW_SECS {
            return Err(ConfigError::Invalid(
                "demotion_penalty_secs exceeds one year".into(),
            ));
        }
        Ok(())
    }

    pub fn receive_throttle(&self) -> Duration {
        window(self.receive_throttle_secs)
    }

    pub fn demotion_penalty(&self) -> Duration {
        window(self.demotion_penalty_secs)
    }
}

fn window(secs: u64) -> Duration {
    // Clamped, so the cast cannot wrap.
    Duration::seconds(secs.min(MAX_WINDOW_SECS) as i64)
}
