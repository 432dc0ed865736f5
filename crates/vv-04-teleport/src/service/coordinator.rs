//! Destination choice and reconciliation of finished migrations.

use std::net::IpAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;
use vv_01_peer_registry::PeerRegistry;

use crate::domain::{MigrationMetrics, MigrationOutcome, MigrationReport, Migrant};
use crate::ports::LocalEngine;

use super::client::MigrationClient;

/// How a `migrate` call was served.
#[derive(Debug)]
pub enum Dispatch {
    /// No remote destination; the organism was reinserted before returning.
    Local,
    /// A handshake is running. The organism is settled (delivered, or
    /// reinserted locally) by the time the handle resolves.
    Remote(JoinHandle<MigrationReport>),
}

/// Entry point used by the simulation when an organism wants to leave.
pub struct MigrationCoordinator {
    registry: Arc<PeerRegistry>,
    engine: Arc<dyn LocalEngine>,
    client: Arc<MigrationClient>,
    metrics: Arc<MigrationMetrics>,
    host_address: IpAddr,
}

impl MigrationCoordinator {
    pub fn new(
        registry: Arc<PeerRegistry>,
        engine: Arc<dyn LocalEngine>,
        client: Arc<MigrationClient>,
        metrics: Arc<MigrationMetrics>,
        host_address: IpAddr,
    ) -> Self {
        Self {
            registry,
            engine,
            client,
            metrics,
            host_address,
        }
    }

    pub fn metrics(&self) -> Arc<MigrationMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Send `migrant` to a random known-good peer, or keep it here.
    ///
    /// Returns without waiting on the network. Must be called from within a
    /// Tokio runtime.
    pub fn migrate(&self, migrant: Migrant) -> Dispatch {
        let destination = match self.registry.pick_random() {
            Ok(peer) if peer == self.host_address => {
                debug!("picked ourselves, migrating locally");
                None
            }
            Ok(peer) => Some(peer),
            Err(_) => None,
        };

        let Some(destination) = destination else {
            self.engine.reinsert(migrant);
            self.metrics.record_local();
            return Dispatch::Local;
        };

        let client = Arc::clone(&self.client);
        let engine = Arc::clone(&self.engine);
        let metrics = Arc::clone(&self.metrics);
        metrics.flight_started();

        Dispatch::Remote(tokio::spawn(async move {
            let result = match client.run(destination, migrant).await {
                MigrationOutcome::Delivered(delivery) => {
                    metrics.record_remote();
                    Ok(delivery)
                }
                MigrationOutcome::Returned { migrant, failure } => {
                    engine.reinsert(migrant);
                    metrics.record_local();
                    Err(failure)
                }
            };
            metrics.flight_finished();
            MigrationReport {
                destination,
                result,
            }
        }))
    }
}

impl std::fmt::Debug for MigrationCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationCoordinator")
            .field("host_address", &self.host_address)
            .field("metrics", &self.metrics.snapshot())
            .finish()
    }
}
