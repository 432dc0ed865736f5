//! Discovery configuration.

use chrono::Duration as LeaseDuration;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

use super::errors::ConfigError;
use super::static_list::StaticPeerList;

/// Seconds between two refreshes.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 300;

/// Lease given to every static peer, counted from the refresh.
pub const DEFAULT_STATIC_LEASE_DAYS: u32 = 5;

/// Timeout of one discovery request.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Discovery configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Pause between refreshes.
    pub refresh_interval_secs: u64,
    /// Base URL of the discovery service.
    pub service_url: String,
    /// Read peers from `static_peers` instead of the service.
    pub use_static_list: bool,
    /// `channel,ip,channel,ip,...`
    pub static_peers: String,
    pub static_lease_days: u32,
    /// Treat the address seen by the discovery service as reachable even if
    /// no local interface carries it (port-forwarded NAT).
    pub assume_reachable: bool,
    /// Address to advertise and listen on, bypassing detection.
    pub local_address: Option<IpAddr>,
    pub request_timeout_secs: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            service_url: "http://localhost:8080/discovery".to_string(),
            use_static_list: false,
            static_peers: String::new(),
            static_lease_days: DEFAULT_STATIC_LEASE_DAYS,
            assume_reachable: false,
            local_address: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl DiscoveryConfig {
    /// One-second refresh, short timeouts.
    pub fn for_testing() -> Self {
        Self {
            refresh_interval_secs: 1,
            request_timeout_secs: 2,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "refresh_interval_secs cannot be 0".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs cannot be 0".into(),
            ));
        }
        if self.static_lease_days == 0 {
            return Err(ConfigError::Invalid("static_lease_days cannot be 0".into()));
        }
        if matches!(self.local_address, Some(addr) if addr.is_unspecified()) {
            return Err(ConfigError::Invalid(
                "local_address must be a concrete address, not 0.0.0.0".into(),
            ));
        }
        if self.use_static_list {
            StaticPeerList::parse(&self.static_peers)
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        } else if self.service_url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "service_url is required unless use_static_list is set".into(),
            ));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn static_lease(&self) -> LeaseDuration {
        LeaseDuration::days(i64::from(self.static_lease_days))
    }
}
