//! # Node Configuration
//!
//! One TOML file with a table per subsystem. Every field has a default, so
//! an empty file (or no file) is a valid configuration.
//!
//! ```toml
//! [node]
//! channel = "EcoSystem"
//!
//! [registry]
//! receive_throttle_secs = 30
//!
//! [discovery]
//! use_static_list = true
//! static_peers = "all,192.168.1.20"
//!
//! [teleport]
//! peer_port = 50000
//! package_dir = "packages"
//! ```
//!
//! `VIVARIUM_*` environment variables override the file; see
//! [`NodeConfig::apply_overrides`].

use serde::{Deserialize, Serialize};
use shared_types::{Channel, DEFAULT_CHANNEL};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;
use vv_01_peer_registry::RegistryConfig;
use vv_02_peer_discovery::DiscoveryConfig;
use vv_04_teleport::TeleportConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("{var}={value:?} is not valid: {reason}")]
    Env {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("[node] {0}")]
    Invalid(String),

    #[error("[registry] {0}")]
    Registry(#[from] vv_01_peer_registry::ConfigError),

    #[error("[discovery] {0}")]
    Discovery(#[from] vv_02_peer_discovery::ConfigError),

    #[error("[teleport] {0}")]
    Teleport(#[from] vv_04_teleport::ConfigError),
}

/// Complete node configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub node: IdentityConfig,
    pub registry: RegistryConfig,
    pub discovery: DiscoveryConfig,
    pub teleport: TeleportConfig,
    pub emigration: EmigrationConfig,
}

/// Who this node is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Only peers on the same channel exchange organisms.
    pub channel: String,
    /// Fixed world id. A fresh one is generated per run when unset.
    pub world_id: Option<Uuid>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            channel: DEFAULT_CHANNEL.to_string(),
            world_id: None,
        }
    }
}

impl IdentityConfig {
    pub fn channel(&self) -> Channel {
        Channel::new(self.channel.trim())
    }
}

/// Periodic emigration of resident organisms.
///
/// The node carries no simulation of its own; this stands in for the
/// engine handing organisms to the teleporter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmigrationConfig {
    /// Seconds between departures. `0` disables emigration.
    pub interval_secs: u64,
    /// Organisms placed in the local population at startup.
    pub seed_organisms: u32,
    pub species: String,
    /// Full name of the package the seeded species lives in.
    pub package: String,
}

impl Default for EmigrationConfig {
    fn default() -> Self {
        Self {
            interval_secs: 0,
            seed_organisms: 0,
            species: "Fern".to_string(),
            package: "Fern, Version=1.0.0.0".to_string(),
        }
    }
}

impl EmigrationConfig {
    pub fn enabled(&self) -> bool {
        self.interval_secs > 0
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl NodeConfig {
    /// Read `path` if given, then apply `VIVARIUM_*` overrides from the
    /// process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply overrides looked up through `lookup`.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `VIVARIUM_CHANNEL` | `node.channel` |
    /// | `VIVARIUM_PORT` | `teleport.peer_port` |
    /// | `VIVARIUM_LOCAL_ADDRESS` | `discovery.local_address` |
    /// | `VIVARIUM_DISCOVERY_URL` | `discovery.service_url` |
    /// | `VIVARIUM_STATIC_PEERS` | `discovery.static_peers`, enables the static list |
    /// | `VIVARIUM_PACKAGE_DIR` | `teleport.package_dir` |
    /// | `VIVARIUM_DEMO_MODE` | `registry.demo_mode` |
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(channel) = lookup("VIVARIUM_CHANNEL") {
            self.node.channel = channel;
        }
        if let Some(port) = lookup("VIVARIUM_PORT") {
            self.teleport.peer_port = parse_env("VIVARIUM_PORT", port)?;
        }
        if let Some(address) = lookup("VIVARIUM_LOCAL_ADDRESS") {
            self.discovery.local_address =
                Some(parse_env::<IpAddr>("VIVARIUM_LOCAL_ADDRESS", address)?);
        }
        if let Some(url) = lookup("VIVARIUM_DISCOVERY_URL") {
            self.discovery.service_url = url;
        }
        if let Some(peers) = lookup("VIVARIUM_STATIC_PEERS") {
            self.discovery.static_peers = peers;
            self.discovery.use_static_list = true;
        }
        if let Some(dir) = lookup("VIVARIUM_PACKAGE_DIR") {
            self.teleport.package_dir = PathBuf::from(dir);
        }
        if let Some(flag) = lookup("VIVARIUM_DEMO_MODE") {
            self.registry.demo_mode = parse_env("VIVARIUM_DEMO_MODE", flag)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node.channel.trim().is_empty() {
            return Err(ConfigError::Invalid("channel cannot be empty".into()));
        }
        if self.emigration.enabled() {
            shared_types::PackageName::new(self.emigration.package.as_str())
                .map_err(|e| ConfigError::Invalid(format!("emigration package: {e}")))?;
        }
        self.registry.validate()?;
        self.discovery.validate()?;
        self.teleport.validate()?;
        Ok(())
    }

    /// Registry settings. A static peer list implies static discovery, so
    /// listed peers are never demoted.
    pub fn effective_registry(&self) -> RegistryConfig {
        RegistryConfig {
            static_discovery: self.registry.static_discovery || self.discovery.use_static_list,
            ..self.registry.clone()
        }
    }
}

fn parse_env<T>(var: &'static str, value: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Env {
        var,
        reason: e.to_string(),
        value,
    })
}
