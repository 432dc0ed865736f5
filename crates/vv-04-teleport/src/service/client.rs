//! The outbound handshake against one peer.

use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, info, warn};
use vv_01_peer_registry::PeerRegistry;
use vv_03_migration_wire::{Locale, MigrationMessage, WireCodec};

use crate::domain::{
    Delivery, MigrationFailure, MigrationMetrics, MigrationOutcome, MigrationStep, Migrant,
    NodeIdentity, StateReply, VersionInfo,
};
use crate::ports::{PackageCache, PeerTransport};

/// Runs the handshake
/// `QueryVersion → CheckCompatibility → CheckPackagePresence →
/// UploadPackageIfAbsent → UploadEntityState → Success`.
///
/// Any failure ends the run with the organism handed back. The peer is
/// demoted unless it explicitly declined the organism.
pub struct MigrationClient {
    identity: NodeIdentity,
    locale: Locale,
    codec: WireCodec,
    transport: Arc<dyn PeerTransport>,
    registry: Arc<PeerRegistry>,
    cache: Arc<dyn PackageCache>,
    metrics: Arc<MigrationMetrics>,
}

impl MigrationClient {
    pub fn new(
        identity: NodeIdentity,
        transport: Arc<dyn PeerTransport>,
        registry: Arc<PeerRegistry>,
        cache: Arc<dyn PackageCache>,
        metrics: Arc<MigrationMetrics>,
    ) -> Self {
        Self {
            identity,
            locale: Locale::default(),
            codec: WireCodec::default(),
            transport,
            registry,
            cache,
            metrics,
        }
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn with_codec(mut self, codec: WireCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    /// Drive the handshake to a terminal state. Never panics, never retries.
    pub async fn run(&self, destination: IpAddr, migrant: Migrant) -> MigrationOutcome {
        let mut step = MigrationStep::QueryVersion;
        match self.handshake(destination, &migrant, &mut step).await {
            Ok(delivery) => {
                info!(
                    peer = %destination,
                    id = %migrant.snapshot.id(),
                    package_uploaded = delivery.package_uploaded,
                    "organism delivered"
                );
                MigrationOutcome::Delivered(delivery)
            }
            Err(failure) => {
                self.metrics.record_failed_send();
                self.metrics
                    .record_error(format!("{destination} at {step:?}: {failure}"));
                if failure.demotes_peer() {
                    self.registry.demote(&destination);
                }
                warn!(
                    peer = %destination,
                    step = ?step,
                    reason = %failure,
                    "migration failed, organism stays local"
                );
                MigrationOutcome::Returned { migrant, failure }
            }
        }
    }

    async fn handshake(
        &self,
        peer: IpAddr,
        migrant: &Migrant,
        step: &mut MigrationStep,
    ) -> Result<Delivery, MigrationFailure> {
        *step = MigrationStep::QueryVersion;
        let remote = self.transport.query_version(peer).await?;

        *step = MigrationStep::CheckCompatibility;
        self.check_compatibility(&remote)?;

        *step = MigrationStep::CheckPackagePresence;
        let package = &migrant.snapshot.species().package;
        let present = self.transport.check_package(peer, package).await?;

        *step = MigrationStep::UploadPackageIfAbsent;
        let package_uploaded = !present;
        if package_uploaded {
            let bytes = self
                .cache
                .load(package)
                .map_err(|e| MigrationFailure::PackageUnavailable(e.to_string()))?;
            let saved = self.transport.upload_package(peer, package, bytes).await?;
            if !saved {
                debug!(peer = %peer, package = %package, "peer did not keep the package");
            }
        }

        *step = MigrationStep::UploadEntityState;
        let frame = self.encode(migrant)?;
        match self
            .transport
            .upload_state(peer, &self.identity.channel, frame)
            .await?
        {
            StateReply::Accepted { assembly_received } => {
                *step = MigrationStep::Success;
                Ok(Delivery {
                    package_uploaded,
                    assembly_received,
                })
            }
            StateReply::Rejected { reason, .. } => Err(MigrationFailure::ProtocolAbort { reason }),
        }
    }

    fn check_compatibility(&self, remote: &VersionInfo) -> Result<(), MigrationFailure> {
        let remote_version = remote.version();
        if remote_version != self.identity.version {
            return Err(MigrationFailure::VersionMismatch {
                local: self.identity.version,
                remote: remote_version,
            });
        }
        if remote.channel != self.identity.channel {
            return Err(MigrationFailure::ChannelMismatch {
                local: self.identity.channel.clone(),
                remote: remote.channel.clone(),
            });
        }
        Ok(())
    }

    fn encode(&self, migrant: &Migrant) -> Result<Vec<u8>, MigrationFailure> {
        let encoding = |e: vv_03_migration_wire::WireError| MigrationFailure::Transport(e.to_string());

        let wrapper = self.codec.encode_wrapper(&migrant.wrapper).map_err(encoding)?;
        let message = MigrationMessage::new(
            self.identity.world_id,
            migrant.snapshot.clone().sealed(),
            wrapper,
            self.identity.channel.clone(),
            false,
            self.locale.clone(),
        )
        .map_err(encoding)?;
        self.codec.encode_message(&message).map_err(encoding)
    }
}

impl std::fmt::Debug for MigrationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationClient")
            .field("identity", &self.identity)
            .finish()
    }
}
