//! Periodic departures from the local population.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use vv_04_teleport::{Dispatch, InMemoryEngine, MigrationCoordinator};

/// Hands one resident organism to the coordinator every `interval`.
pub struct EmigrationLoop {
    engine: Arc<InMemoryEngine>,
    coordinator: Arc<MigrationCoordinator>,
    interval: Duration,
}

impl EmigrationLoop {
    pub fn new(
        engine: Arc<InMemoryEngine>,
        coordinator: Arc<MigrationCoordinator>,
        interval: Duration,
    ) -> Self {
        Self {
            engine,
            coordinator,
            interval,
        }
    }

    /// Send one organism on its way. `None` when nobody is home.
    pub fn tick(&self) -> Option<Dispatch> {
        let migrant = self.engine.take_resident()?;
        debug!(id = %migrant.snapshot.id(), "organism leaving");
        Some(self.coordinator.migrate(migrant))
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(interval_secs = self.interval.as_secs(), "emigration started");
        loop {
            if *shutdown.borrow() {
                break;
            }
            let sender_gone = tokio::select! {
                _ = tokio::time::sleep(self.interval) => false,
                changed = shutdown.changed() => changed.is_err(),
            };
            if sender_gone {
                break;
            }
            if !*shutdown.borrow() {
                let _dispatch = self.tick();
            }
        }
        info!("emigration stopped");
    }

    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
