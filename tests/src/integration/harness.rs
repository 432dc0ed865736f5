//! # Live Test Nodes
//!
//! A [`TestNode`] is one peer: registry on a controllable clock, package
//! cache in a temporary directory, in-memory population, and the inbound
//! HTTP surface bound to its own loopback address.

use shared_types::{Channel, EntitySnapshot, PackageName, Point, ProtocolVersion, SpeciesKind, SpeciesRef};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;
use vv_01_peer_registry::test_utils::ControllableTimeSource;
use vv_01_peer_registry::{PeerLease, PeerRegistry, RegistryConfig, TimeSource};
use vv_02_peer_discovery::DiscoveryStatus;
use vv_04_teleport::{
    FsPackageCache, HttpPeerTransport, InMemoryEngine, Migrant, MigrationClient,
    MigrationCoordinator, MigrationMetrics, MigrationRequestHandler, NodeIdentity, PackageCache,
    TeleportConfig,
};

pub const NODE_A: IpAddr = IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1));
pub const NODE_B: IpAddr = IpAddr::V4(Ipv4Addr::new(127, 0, 0, 2));
/// Nothing ever listens here.
pub const NODE_DOWN: IpAddr = IpAddr::V4(Ipv4Addr::new(127, 0, 0, 3));

pub const FERN_PACKAGE: &str = "Fern, Version=1.0.0.0";
pub const FERN_CODE: &[u8] = b"fern species code";

/// Clock start, in seconds since the epoch.
const CLOCK_START: i64 = 1_700_000_000;

/// A port free on `127.0.0.1`, hence on the whole loopback block in practice.
pub fn free_port() -> u16 {
    std::net::TcpListener::bind((NODE_A, 0))
        .and_then(|listener| listener.local_addr())
        .map(|addr| addr.port())
        .expect("no free port")
}

pub fn fern_package() -> PackageName {
    PackageName::new(FERN_PACKAGE).unwrap()
}

pub fn fern() -> Migrant {
    let species = SpeciesRef {
        name: "Fern".into(),
        package: fern_package(),
        kind: SpeciesKind::Plant,
    };
    Migrant::new(EntitySnapshot::new(Uuid::new_v4(), species, Point::new(12, 30)))
}

/// Poll `condition` every 20ms until it holds or `limit` passes.
pub async fn eventually<F: Fn() -> bool>(limit: Duration, condition: F) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}

/// What distinguishes one test node from another.
#[derive(Debug, Clone)]
pub struct NodeOptions {
    pub version: ProtocolVersion,
    pub channel: Channel,
    pub registry: RegistryConfig,
}

impl Default for NodeOptions {
    fn default() -> Self {
        Self {
            version: ProtocolVersion::current(),
            channel: Channel::default(),
            registry: RegistryConfig::default(),
        }
    }
}

pub struct TestNode {
    pub address: IpAddr,
    pub port: u16,
    pub identity: NodeIdentity,
    pub registry: Arc<PeerRegistry>,
    pub clock: ControllableTimeSource,
    pub cache: Arc<FsPackageCache>,
    pub engine: Arc<InMemoryEngine>,
    pub metrics: Arc<MigrationMetrics>,
    pub coordinator: MigrationCoordinator,
    shutdown: watch::Sender<bool>,
    server: JoinHandle<()>,
    _dir: TempDir,
}

impl TestNode {
    pub async fn start(address: IpAddr, port: u16, options: NodeOptions) -> Self {
        let config = TeleportConfig {
            peer_port: port,
            ..TeleportConfig::for_testing()
        };
        let identity = NodeIdentity {
            world_id: Uuid::new_v4(),
            version: options.version,
            channel: options.channel,
        };

        let clock = ControllableTimeSource::new(CLOCK_START);
        let registry = Arc::new(PeerRegistry::new(options.registry, Box::new(clock.clone())));
        let dir = TempDir::new().unwrap();
        let cache = Arc::new(FsPackageCache::open(dir.path().join("packages")).unwrap());
        let engine = Arc::new(InMemoryEngine::new());
        let metrics = Arc::new(MigrationMetrics::new());

        let transport =
            HttpPeerTransport::bound_to(port, config.request_timeout(), address).unwrap();
        let client = MigrationClient::new(
            identity.clone(),
            Arc::new(transport),
            Arc::clone(&registry),
            cache.clone(),
            Arc::clone(&metrics),
        );
        let coordinator = MigrationCoordinator::new(
            Arc::clone(&registry),
            engine.clone(),
            Arc::new(client),
            Arc::clone(&metrics),
            address,
        );

        let handler = MigrationRequestHandler::new(
            identity.clone(),
            Arc::clone(&registry),
            cache.clone(),
            engine.clone(),
            Arc::clone(&metrics),
            Arc::new(DiscoveryStatus::new()),
        )
        .with_body_limit(config.body_limit());

        let listener = TcpListener::bind(SocketAddr::new(address, port))
            .await
            .unwrap();
        let (shutdown, shutdown_rx) = watch::channel(false);
        let server = tokio::spawn(async move {
            handler.serve(listener, shutdown_rx).await.unwrap();
        });

        Self {
            address,
            port,
            identity,
            registry,
            clock,
            cache,
            engine,
            metrics,
            coordinator,
            shutdown,
            server,
            _dir: dir,
        }
    }

    /// Make `peers` the known-good set, leased for five days.
    pub fn trust(&self, peers: &[IpAddr]) {
        let lease = self.clock.now() + chrono::Duration::days(5);
        self.registry
            .replace_known_good(peers.iter().map(|&peer| PeerLease::new(peer, lease)));
    }

    pub fn install_fern(&self) {
        let mut source = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut source, FERN_CODE).unwrap();
        self.cache.install(source.path(), &fern_package()).unwrap();
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", SocketAddr::new(self.address, self.port), path)
    }

    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = tokio::time::timeout(Duration::from_secs(5), self.server).await;
    }
}
