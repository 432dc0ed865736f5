//! # Node Runtime
//!
//! ## Startup Sequence
//!
//! 1. Resolve the host address (configured, seen by discovery, or local)
//! 2. Start the discovery loop
//! 3. Bind the peer listener and start serving
//! 4. Seed the local population and start emigration, if configured

use anyhow::{Context, Result};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use vv_01_peer_registry::SystemTimeSource;
use vv_02_peer_discovery::{resolve_host_address, DiscoveryLoop, SystemInterfaces};
use vv_04_teleport::MigrationCoordinator;

use crate::container::{NodeConfig, NodeContainer};
use crate::emigration::EmigrationLoop;

/// How long shutdown waits for background tasks.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// A running node.
pub struct NodeRuntime {
    container: Arc<NodeContainer>,
    coordinator: Option<Arc<MigrationCoordinator>>,
    listen_address: Option<SocketAddr>,
    tasks: Vec<JoinHandle<()>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl NodeRuntime {
    pub fn new(config: NodeConfig) -> Result<Self> {
        let container = Arc::new(NodeContainer::new(config)?);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Ok(Self {
            container,
            coordinator: None,
            listen_address: None,
            tasks: Vec::new(),
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Start every subsystem. Returns the address the peer listener is
    /// bound to.
    pub async fn start(&mut self) -> Result<SocketAddr> {
        let container = Arc::clone(&self.container);
        let config = &container.config;

        // Step 1: host address
        let service = container.discovery_service()?;
        let host = resolve_host_address(&config.discovery, service.as_deref(), &SystemInterfaces)
            .await;
        if let Some(warning) = host.warning {
            warn!(address = %host.address, "{warning}");
            container.discovery_status.set_message(warning);
        }
        info!(address = %host.address, "host address resolved");

        // Step 2: discovery
        let discovery = DiscoveryLoop::new(
            config.discovery.clone(),
            Arc::clone(&container.registry),
            container.peer_source(service)?,
            Arc::new(SystemInterfaces),
            container.registration(),
            host.address,
            Box::new(SystemTimeSource::new()),
        )
        .with_status(Arc::clone(&container.discovery_status));
        self.tasks.push(discovery.spawn(self.shutdown_rx.clone()));

        // Step 3: peer listener
        let coordinator = Arc::new(container.coordinator(host.address)?);
        let bind_ip = config
            .discovery
            .local_address
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        let listener = TcpListener::bind(SocketAddr::new(bind_ip, config.teleport.peer_port))
            .await
            .with_context(|| {
                format!("cannot listen on {bind_ip}:{}", config.teleport.peer_port)
            })?;
        let listen_address = listener.local_addr().context("listener has no address")?;

        let handler = container.request_handler();
        let shutdown = self.shutdown_rx.clone();
        self.tasks.push(tokio::spawn(async move {
            if let Err(e) = handler.serve(listener, shutdown).await {
                error!(error = %e, "peer listener failed");
            }
        }));
        info!(%listen_address, "peer listener started");

        // Step 4: emigration
        container.seed_population()?;
        if config.emigration.enabled() {
            let emigration = EmigrationLoop::new(
                container.engine.clone(),
                Arc::clone(&coordinator),
                config.emigration.interval(),
            );
            self.tasks.push(emigration.spawn(self.shutdown_rx.clone()));
        }

        self.coordinator = Some(coordinator);
        self.listen_address = Some(listen_address);
        Ok(listen_address)
    }

    pub fn container(&self) -> Arc<NodeContainer> {
        Arc::clone(&self.container)
    }

    /// Available once started.
    pub fn coordinator(&self) -> Option<Arc<MigrationCoordinator>> {
        self.coordinator.clone()
    }

    pub fn listen_address(&self) -> Option<SocketAddr> {
        self.listen_address
    }

    /// Signal every task to stop and wait for them, up to a grace period.
    pub async fn shutdown(self) {
        info!("initiating graceful shutdown");
        if self.shutdown_tx.send(true).is_err() {
            warn!("no task was listening for shutdown");
        }
        for task in self.tasks {
            match tokio::time::timeout(SHUTDOWN_GRACE, task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(error = %e, "task ended abnormally"),
                Err(_) => warn!("task did not stop within the grace period"),
            }
        }
        info!("shutdown complete");
    }
}

impl std::fmt::Debug for NodeRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRuntime")
            .field("container", &self.container)
            .field("listen_address", &self.listen_address)
            .field("tasks", &self.tasks.len())
            .finish()
    }
}
