//! # Outbound Ports
//!
//! Collaborators the migration subsystem calls but does not own.

use async_trait::async_trait;
use shared_types::{Channel, PackageName};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::Path;

use crate::domain::{CacheError, Migrant, StateReply, TransportError, VersionInfo};

/// Local store of species code packages.
pub trait PackageCache: Send + Sync {
    /// True if a usable copy of `package` is installed.
    fn exists(&self, package: &PackageName) -> bool;

    /// Install the file at `source` as `package`. `source` is left in place.
    fn install(&self, source: &Path, package: &PackageName) -> Result<(), CacheError>;

    fn load(&self, package: &PackageName) -> Result<Vec<u8>, CacheError>;

    /// Names of packages refused locally.
    fn blacklisted(&self) -> Vec<String>;
}

/// The running simulation.
pub trait LocalEngine: Send + Sync {
    /// Put back an organism whose migration did not happen.
    fn reinsert(&self, migrant: Migrant);

    /// Accept an organism from a peer. `package_present` tells whether its
    /// code is already installed.
    fn receive_migration(&self, migrant: Migrant, package_present: bool);

    /// `package` was just installed. Returns how many waiting organisms
    /// it brought to life.
    fn package_installed(&self, package: &PackageName) -> usize {
        let _ = package;
        0
    }

    /// Live organisms per species name.
    fn population(&self) -> BTreeMap<String, u64>;
}

/// Requests of the outbound handshake.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn query_version(&self, peer: IpAddr) -> Result<VersionInfo, TransportError>;

    async fn check_package(
        &self,
        peer: IpAddr,
        package: &PackageName,
    ) -> Result<bool, TransportError>;

    async fn upload_package(
        &self,
        peer: IpAddr,
        package: &PackageName,
        bytes: Vec<u8>,
    ) -> Result<bool, TransportError>;

    async fn upload_state(
        &self,
        peer: IpAddr,
        channel: &Channel,
        frame: Vec<u8>,
    ) -> Result<StateReply, TransportError>;
}
