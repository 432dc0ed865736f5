//! # Subsystem Container
//!
//! Builds the shared pieces every subsystem draws on: the peer registry,
//! package cache, local population, metrics and discovery status. The
//! network-facing parts (discovery source, transport, handler) are built
//! from here once the host address is known.

pub mod config;

pub use config::{ConfigError, EmigrationConfig, IdentityConfig, NodeConfig};

use anyhow::{Context, Result};
use shared_types::{EntitySnapshot, PackageName, Point, SpeciesKind, SpeciesRef};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use vv_01_peer_registry::{PeerRegistry, SystemTimeSource};
use vv_02_peer_discovery::{
    DiscoveryService, DiscoveryStatus, HttpDiscoveryClient, PeerSource, Registration,
    StaticPeerList,
};
use vv_03_migration_wire::{Locale, WireCodec};
use vv_04_teleport::{
    FsPackageCache, HttpPeerTransport, InMemoryEngine, Migrant, MigrationClient,
    MigrationCoordinator, MigrationMetrics, MigrationRequestHandler, NodeIdentity,
};

/// Everything a node shares between its subsystems.
pub struct NodeContainer {
    pub config: NodeConfig,
    pub identity: NodeIdentity,
    pub registry: Arc<PeerRegistry>,
    pub cache: Arc<FsPackageCache>,
    pub engine: Arc<InMemoryEngine>,
    pub metrics: Arc<MigrationMetrics>,
    pub discovery_status: Arc<DiscoveryStatus>,
    pub codec: WireCodec,
}

impl NodeContainer {
    pub fn new(config: NodeConfig) -> Result<Self> {
        config.validate().context("invalid configuration")?;

        let identity = NodeIdentity::new(
            config.node.world_id.unwrap_or_else(Uuid::new_v4),
            config.node.channel(),
        );
        let registry = Arc::new(PeerRegistry::new(
            config.effective_registry(),
            Box::new(SystemTimeSource::new()),
        ));
        let cache = Arc::new(
            FsPackageCache::open(&config.teleport.package_dir)
                .context("cannot open package cache")?,
        );
        let codec = WireCodec::new(config.teleport.max_state_bytes);

        info!(
            world_id = %identity.world_id,
            version = %identity.version,
            channel = %identity.channel,
            "node identity"
        );

        Ok(Self {
            identity,
            registry,
            cache,
            engine: Arc::new(InMemoryEngine::new()),
            metrics: Arc::new(MigrationMetrics::new()),
            discovery_status: Arc::new(DiscoveryStatus::new()),
            codec,
            config,
        })
    }

    /// The discovery service client, unless the static list is in use.
    pub fn discovery_service(&self) -> Result<Option<Arc<dyn DiscoveryService>>> {
        let discovery = &self.config.discovery;
        if discovery.use_static_list {
            return Ok(None);
        }
        let client = HttpDiscoveryClient::new(&discovery.service_url, discovery.request_timeout())
            .context("cannot build discovery client")?;
        Ok(Some(Arc::new(client)))
    }

    pub fn peer_source(&self, service: Option<Arc<dyn DiscoveryService>>) -> Result<PeerSource> {
        match service {
            Some(service) => Ok(PeerSource::Service(service)),
            None => {
                let list = StaticPeerList::parse(&self.config.discovery.static_peers)
                    .context("invalid static peer list")?;
                Ok(PeerSource::Static(list))
            }
        }
    }

    pub fn registration(&self) -> Registration {
        Registration {
            version: self.identity.version,
            channel: self.identity.channel.clone(),
            world_id: self.identity.world_id,
        }
    }

    /// Outbound transport. With a configured local address, connections
    /// leave from it so peers see the address we advertise.
    pub fn transport(&self) -> Result<HttpPeerTransport> {
        let teleport = &self.config.teleport;
        let transport = match self.config.discovery.local_address {
            Some(local) => {
                HttpPeerTransport::bound_to(teleport.peer_port, teleport.request_timeout(), local)
            }
            None => HttpPeerTransport::new(teleport.peer_port, teleport.request_timeout()),
        };
        transport.context("cannot build peer transport")
    }

    pub fn coordinator(&self, host_address: IpAddr) -> Result<MigrationCoordinator> {
        let client = MigrationClient::new(
            self.identity.clone(),
            Arc::new(self.transport()?),
            Arc::clone(&self.registry),
            self.cache.clone(),
            Arc::clone(&self.metrics),
        )
        .with_locale(Locale::new(
            self.config.teleport.country.as_str(),
            self.config.teleport.region.as_str(),
        ))
        .with_codec(self.codec);

        Ok(MigrationCoordinator::new(
            Arc::clone(&self.registry),
            self.engine.clone(),
            Arc::new(client),
            Arc::clone(&self.metrics),
            host_address,
        ))
    }

    pub fn request_handler(&self) -> MigrationRequestHandler {
        MigrationRequestHandler::new(
            self.identity.clone(),
            Arc::clone(&self.registry),
            self.cache.clone(),
            self.engine.clone(),
            Arc::clone(&self.metrics),
            Arc::clone(&self.discovery_status),
        )
        .with_codec(self.codec)
        .with_body_limit(self.config.teleport.body_limit())
    }

    /// Place the configured number of organisms in the local population.
    pub fn seed_population(&self) -> Result<u32> {
        let emigration = &self.config.emigration;
        if emigration.seed_organisms == 0 {
            return Ok(0);
        }
        let package = PackageName::new(emigration.package.as_str())
            .context("invalid emigration package name")?;
        for i in 0..emigration.seed_organisms {
            let species = SpeciesRef {
                name: emigration.species.clone(),
                package: package.clone(),
                kind: SpeciesKind::Plant,
            };
            let offset = i32::try_from(i).unwrap_or(i32::MAX);
            let snapshot = EntitySnapshot::new(Uuid::new_v4(), species, Point::new(offset, offset));
            self.engine.insert(Migrant::new(snapshot));
        }
        info!(
            count = emigration.seed_organisms,
            species = %emigration.species,
            "seeded local population"
        );
        Ok(emigration.seed_organisms)
    }
}

impl std::fmt::Debug for NodeContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeContainer")
            .field("identity", &self.identity)
            .field("registry", &self.registry)
            .finish()
    }
}
