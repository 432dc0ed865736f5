//! # Inbound Peer Surface
//!
//! | Method | Path | Reply |
//! |--------|------|-------|
//! | GET  | `/version` | `{major, minor, build, channel}` |
//! | POST | `/organisms/assemblycheck` | `{exists}` |
//! | POST | `/organisms/assemblies` | `{saved}` |
//! | POST | `/organisms/state` | `{assemblyReceived}` or `{arrived: false, reason}` |
//! | GET  | `/organisms/stats` | diagnostics |
//!
//! Other methods on these paths get 405, other GETs under `/organisms` get
//! 400, everything else 404. Replies carry fixed strings only.

use axum::body::Bytes;
use axum::extract::{ConnectInfo, DefaultBodyLimit, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use shared_types::PackageName;
use std::io::Write;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use vv_01_peer_registry::PeerRegistry;
use vv_02_peer_discovery::DiscoveryStatus;
use vv_03_migration_wire::WireCodec;

use crate::domain::{
    CacheError, InboundRejection, MigrationMetrics, Migrant, NodeIdentity, PackageCheck,
    PackageSaved, PeerStats, RuntimeStats, StateReply, StatsDocument, VersionInfo,
    DEFAULT_MAX_PACKAGE_BYTES, PACKAGE_NAME_HEADER, PEER_CHANNEL_HEADER,
};
use crate::ports::{LocalEngine, PackageCache};


/// Answers peers: version queries, package checks and uploads, organism
/// deliveries, and operator stats.
pub struct MigrationRequestHandler {
    identity: NodeIdentity,
    registry: Arc<PeerRegistry>,
    cache: Arc<dyn PackageCache>,
    engine: Arc<dyn LocalEngine>,
    metrics: Arc<MigrationMetrics>,
    discovery: Arc<DiscoveryStatus>,
    codec: WireCodec,
    body_limit: usize,
}

impl MigrationRequestHandler {
    pub fn new(
        identity: NodeIdentity,
        registry: Arc<PeerRegistry>,
        cache: Arc<dyn PackageCache>,
        engine: Arc<dyn LocalEngine>,
        metrics: Arc<MigrationMetrics>,
        discovery: Arc<DiscoveryStatus>,
    ) -> Self {
        Self {
            identity,
            registry,
            cache,
            engine,
            metrics,
            discovery,
            codec: WireCodec::default(),
            body_limit: DEFAULT_MAX_PACKAGE_BYTES,
        }
    }

    pub fn with_codec(mut self, codec: WireCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = bytes;
        self
    }

    // =========================================================================
    // OPERATIONS
    // =========================================================================

    pub fn version(&self) -> VersionInfo {
        VersionInfo::new(self.identity.version, self.identity.channel.clone())
    }

    pub fn check_package(&self, name: &str) -> PackageCheck {
        let exists = PackageName::new(name)
            .map(|package| self.cache.exists(&package))
            .unwrap_or(false);
        debug!(package = %name.trim(), exists, "package check");
        PackageCheck { exists }
    }

    /// Install an uploaded package. The sender must be known-good, not
    /// blacklisted, and outside its throttle window; the window is not
    /// claimed, so the organism that follows can still be delivered.
    pub async fn receive_package(
        &self,
        sender: IpAddr,
        name: Option<&str>,
        bytes: Bytes,
    ) -> PackageSaved {
        if let Err(e) = self.registry.check_admission(&sender) {
            let rejection = InboundRejection::from(e);
            info!(peer = %sender, reason = %rejection, "package upload refused");
            self.metrics.record_failed_receive();
            return PackageSaved { saved: false };
        }

        let Some(package) = name.and_then(|n| PackageName::new(n).ok()) else {
            warn!(peer = %sender, "package upload without a usable name");
            self.metrics.record_failed_receive();
            return PackageSaved { saved: false };
        };

        let cache = Arc::clone(&self.cache);
        let staged = package.clone();
        let installed =
            tokio::task::spawn_blocking(move || install_from_temp(cache.as_ref(), &staged, &bytes))
                .await;

        match installed {
            Ok(Ok(())) => {
                let released = self.engine.package_installed(&package);
                info!(peer = %sender, package = %package, released, "package received");
                PackageSaved { saved: true }
            }
            Ok(Err(e)) => {
                warn!(peer = %sender, package = %package, error = %e, "package install failed");
                self.metrics.record_failed_receive();
                self.metrics
                    .record_error(format!("install of {package} from {sender}: {e}"));
                PackageSaved { saved: false }
            }
            Err(e) => {
                warn!(peer = %sender, error = %e, "package install task failed");
                self.metrics.record_failed_receive();
                PackageSaved { saved: false }
            }
        }
    }

    /// Accept or refuse an organism delivered by `sender`.
    pub fn receive_state(&self, sender: IpAddr, channel: Option<&str>, frame: &[u8]) -> StateReply {
        match self.accept_state(sender, channel, frame) {
            Ok(package_present) => StateReply::Accepted {
                assembly_received: package_present,
            },
            Err(rejection) => {
                info!(peer = %sender, reason = %rejection, "organism refused");
                self.metrics.record_failed_receive();
                self.metrics
                    .record_error(format!("delivery from {sender}: {rejection}"));
                StateReply::rejected(rejection.to_string())
            }
        }
    }

    fn accept_state(
        &self,
        sender: IpAddr,
        channel: Option<&str>,
        frame: &[u8],
    ) -> Result<bool, InboundRejection> {
        if !channel.is_some_and(|c| self.identity.channel.matches(c)) {
            return Err(InboundRejection::ChannelMismatch);
        }
        let claim = self.registry.admit(&sender)?;

        let (message, wrapper) = match self.codec.decode_delivery(frame) {
            Ok(decoded) => decoded,
            Err(e) => {
                if e.is_security_violation() {
                    warn!(peer = %sender, error = %e, "disallowed type in delivery");
                } else {
                    debug!(peer = %sender, error = %e, "undecodable delivery");
                }
                self.registry.release_claim(claim);
                return Err(InboundRejection::Undecodable);
            }
        };

        let snapshot = message.into_snapshot();
        let package_present = self.cache.exists(&snapshot.species().package);
        info!(
            peer = %sender,
            id = %snapshot.id(),
            species = %snapshot.species().name,
            package_present,
            "organism arrived"
        );
        self.engine
            .receive_migration(Migrant { snapshot, wrapper }, package_present);
        Ok(package_present)
    }

    pub fn stats(&self) -> StatsDocument {
        StatsDocument {
            world_id: self.identity.world_id,
            version: self.identity.version.to_string(),
            channel: self.identity.channel.clone(),
            migrations: self.metrics.snapshot(),
            peers: PeerStats::new(self.registry.report(), self.discovery.snapshot()),
            population: self.engine.population(),
            blacklisted_packages: self.cache.blacklisted(),
            runtime: RuntimeStats::current(),
        }
    }

    // =========================================================================
    // HTTP
    // =========================================================================

    pub fn router(self) -> Router {
        let body_limit = self.body_limit;
        let state = Arc::new(self);

        Router::new()
            .route("/version", get(handle_version).fallback(method_not_allowed))
            .route("/organisms", get(get_not_supported).fallback(not_supported))
            .route(
                "/organisms/assemblycheck",
                post(handle_package_check)
                    .get(get_not_supported)
                    .fallback(method_not_allowed),
            )
            .route(
                "/organisms/assemblies",
                post(handle_package_upload)
                    .get(get_not_supported)
                    .fallback(method_not_allowed),
            )
            .route(
                "/organisms/state",
                post(handle_state_upload)
                    .get(get_not_supported)
                    .fallback(method_not_allowed),
            )
            .route(
                "/organisms/stats",
                get(handle_stats).fallback(method_not_allowed),
            )
            .route(
                "/organisms/*rest",
                get(get_not_supported).fallback(not_supported),
            )
            .fallback(not_supported)
            .layer(DefaultBodyLimit::max(body_limit))
            .with_state(state)
    }

    /// Serve on `listener` until `shutdown` holds true.
    pub async fn serve(
        self,
        listener: TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> std::io::Result<()> {
        let router = self.router();
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            while !*shutdown.borrow() {
                if shutdown.changed().await.is_err() {
                    break;
                }
            }
        })
        .await
    }
}

impl std::fmt::Debug for MigrationRequestHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationRequestHandler")
            .field("identity", &self.identity)
            .field("body_limit", &self.body_limit)
            .finish()
    }
}

/// Write `bytes` to a randomly named temporary file and install it. The
/// temporary file is removed on every path.
fn install_from_temp(
    cache: &dyn PackageCache,
    package: &PackageName,
    bytes: &[u8],
) -> Result<(), CacheError> {
    let io_err = |source: std::io::Error| CacheError::Io {
        path: std::env::temp_dir(),
        source,
    };
    let mut temp = tempfile::NamedTempFile::new().map_err(io_err)?;
    temp.write_all(bytes).map_err(io_err)?;
    temp.flush().map_err(io_err)?;
    cache.install(temp.path(), package)
}

type SharedHandler = State<Arc<MigrationRequestHandler>>;

fn sender_of(peer: SocketAddr) -> IpAddr {
    peer.ip().to_canonical()
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

async fn handle_version(State(handler): SharedHandler) -> Json<VersionInfo> {
    Json(handler.version())
}

async fn handle_package_check(State(handler): SharedHandler, body: String) -> Json<PackageCheck> {
    Json(handler.check_package(&body))
}

async fn handle_package_upload(
    State(handler): SharedHandler,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<PackageSaved> {
    let name = header(&headers, PACKAGE_NAME_HEADER);
    Json(handler.receive_package(sender_of(peer), name, body).await)
}

async fn handle_state_upload(
    State(handler): SharedHandler,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<StateReply> {
    let channel = header(&headers, PEER_CHANNEL_HEADER);
    Json(handler.receive_state(sender_of(peer), channel, &body))
}

async fn handle_stats(State(handler): SharedHandler) -> Json<StatsDocument> {
    Json(handler.stats())
}

async fn get_not_supported() -> impl IntoResponse {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "GET is not supported for this resource" })),
    )
}

async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "method not allowed" })),
    )
}

async fn not_supported() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "not supported" })),
    )
}
