//! Test utilities for the peer registry.
//!
//! Enable with the `test-utils` feature flag.
//!
//! # Example
//!
//! ```rust
//! use vv_01_peer_registry::test_utils::ControllableTimeSource;
//! use vv_01_peer_registry::TimeSource;
//!
//! let clock = ControllableTimeSource::new(1_000);
//! let shared = clock.clone();
//! shared.advance(30);
//! assert_eq!(clock.now().timestamp(), 1_030);
//! ```

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::ports::TimeSource;

/// Thread-safe TimeSource for tests requiring time advancement.
///
/// Clones share one clock, so a test can keep a handle while the registry
/// owns another.
#[derive(Debug, Clone)]
pub struct ControllableTimeSource {
    secs: Arc<AtomicI64>,
}

impl ControllableTimeSource {
    /// Start the clock at `initial` seconds since the Unix epoch.
    pub fn new(initial: i64) -> Self {
        Self {
            secs: Arc::new(AtomicI64::new(initial)),
        }
    }

    /// Advances the clock by `secs` seconds.
    pub fn advance(&self, secs: i64) {
        self.secs.fetch_add(secs, Ordering::SeqCst);
    }

    pub fn set(&self, secs: i64) {
        self.secs.store(secs, Ordering::SeqCst);
    }
}

impl TimeSource for ControllableTimeSource {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.secs.load(Ordering::SeqCst), 0).unwrap_or_default()
    }
}
