//! Migration counters.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Cumulative migration counters.
///
/// Every `migrate` call ends as exactly one local or remote migration, and
/// both count toward `total`.
#[derive(Debug, Default)]
pub struct MigrationMetrics {
    total: AtomicU64,
    local: AtomicU64,
    remote: AtomicU64,
    failed_sends: AtomicU64,
    failed_receives: AtomicU64,
    in_flight: AtomicU64,
    last_error: Mutex<Option<String>>,
}

impl MigrationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Organism stayed, or came back, home.
    pub fn record_local(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.local.fetch_add(1, Ordering::Relaxed);
    }

    /// Organism accepted by a peer.
    pub fn record_remote(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.remote.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed_send(&self) {
        self.failed_sends.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed_receive(&self) {
        self.failed_receives.fetch_add(1, Ordering::Relaxed);
    }

    pub fn flight_started(&self) {
        self.in_flight.fetch_add(1, Ordering::Relaxed);
    }

    pub fn flight_finished(&self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn record_error(&self, error: impl Into<String>) {
        *self.last_error.lock() = Some(error.into());
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total: self.total.load(Ordering::Relaxed),
            local: self.local.load(Ordering::Relaxed),
            remote: self.remote.load(Ordering::Relaxed),
            failed_sends: self.failed_sends.load(Ordering::Relaxed),
            failed_receives: self.failed_receives.load(Ordering::Relaxed),
            in_flight: self.in_flight.load(Ordering::Relaxed),
            last_error: self.last_error.lock().clone(),
        }
    }
}

/// Point-in-time copy of [`MigrationMetrics`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub total: u64,
    pub local: u64,
    pub remote: u64,
    pub failed_sends: u64,
    pub failed_receives: u64,
    pub in_flight: u64,
    pub last_error: Option<String>,
}
