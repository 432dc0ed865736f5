use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use vv_01_peer_registry::{PeerRegistry, TimeSource};

use crate::domain::{
    DiscoveryConfig, DiscoveryError, DiscoveryStatus, StaticPeerList, BEHIND_NAT_MESSAGE,
};
use crate::host::is_reachable;
use crate::ports::{DiscoveryService, LocalInterfaces, PeerListing, Registration};

/// Where peer tables come from.
#[derive(Clone)]
pub enum PeerSource {
    Service(Arc<dyn DiscoveryService>),
    Static(StaticPeerList),
}

impl std::fmt::Debug for PeerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeerSource::Service(_) => f.write_str("Service"),
            PeerSource::Static(list) => f.debug_tuple("Static").field(&list.entries().len()).finish(),
        }
    }
}

/// Result of one successful refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The known-good set was replaced.
    Refreshed { known_good: usize, on_channel: u32 },
    /// The discovery service sees an address peers cannot reach; the
    /// registry was left untouched.
    Unreachable { observed: IpAddr },
}

/// Periodic refresh of the peer registry.
pub struct DiscoveryLoop {
    config: DiscoveryConfig,
    registry: Arc<PeerRegistry>,
    source: PeerSource,
    interfaces: Arc<dyn LocalInterfaces>,
    identity: Registration,
    host_address: IpAddr,
    status: Arc<DiscoveryStatus>,
    time_source: Box<dyn TimeSource>,
}

impl DiscoveryLoop {
    pub fn new(
        config: DiscoveryConfig,
        registry: Arc<PeerRegistry>,
        source: PeerSource,
        interfaces: Arc<dyn LocalInterfaces>,
        identity: Registration,
        host_address: IpAddr,
        time_source: Box<dyn TimeSource>,
    ) -> Self {
        Self {
            config,
            registry,
            source,
            interfaces,
            identity,
            host_address,
            status: Arc::new(DiscoveryStatus::new()),
            time_source,
        }
    }

    /// Share an existing status handle instead of the loop's own.
    pub fn with_status(mut self, status: Arc<DiscoveryStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn status(&self) -> Arc<DiscoveryStatus> {
        Arc::clone(&self.status)
    }

    pub fn host_address(&self) -> IpAddr {
        self.host_address
    }

    /// One iteration: truncate, check reachability, fetch, reconcile.
    pub async fn refresh_once(&self) -> Result<RefreshOutcome, DiscoveryError> {
        self.registry.truncate_blacklist();

        let listing = match &self.source {
            PeerSource::Static(list) => {
                let peers = list.leases(
                    &self.identity.channel,
                    self.time_source.now(),
                    self.config.static_lease(),
                );
                PeerListing {
                    peers_on_channel: u32::try_from(peers.len()).unwrap_or(u32::MAX),
                    peers,
                }
            }
            PeerSource::Service(service) => {
                let observed = service.validate_address().await?;
                if !is_reachable(observed, &self.config, self.interfaces.as_ref()) {
                    warn!(%observed, "not reachable from the outside, skipping refresh");
                    self.status.set_message(BEHIND_NAT_MESSAGE);
                    return Ok(RefreshOutcome::Unreachable { observed });
                }
                service.register_and_list(&self.identity).await?
            }
        };

        let mut fresh = Vec::with_capacity(listing.peers.len());
        for peer in listing.peers {
            if peer.address == self.host_address {
                continue;
            }
            if !self.registry.reinstate_if_fresher(&peer.address, peer.lease) {
                continue;
            }
            fresh.push(peer);
        }

        let known_good = fresh.len();
        self.registry.replace_known_good(fresh);
        self.status
            .record_refresh(listing.peers_on_channel, self.time_source.now());

        Ok(RefreshOutcome::Refreshed {
            known_good,
            on_channel: listing.peers_on_channel,
        })
    }

    /// Refresh until `shutdown` holds true or its sender is dropped.
    ///
    /// A refresh in progress is allowed to finish; only the sleep between
    /// refreshes is interrupted.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.config.refresh_interval_secs,
            source = ?self.source,
            "discovery loop started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            match self.refresh_once().await {
                Ok(outcome) => debug!(?outcome, "discovery refresh complete"),
                Err(e) => warn!(error = %e, "discovery refresh failed, keeping current peers"),
            }

            let sender_gone = tokio::select! {
                _ = tokio::time::sleep(self.config.refresh_interval()) => false,
                changed = shutdown.changed() => changed.is_err(),
            };
            if sender_gone {
                break;
            }
        }

        info!("discovery loop stopped");
    }

    /// Run on its own task.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}

impl std::fmt::Debug for DiscoveryLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryLoop")
            .field("source", &self.source)
            .field("host_address", &self.host_address)
            .field("channel", &self.identity.channel)
            .finish()
    }
}
