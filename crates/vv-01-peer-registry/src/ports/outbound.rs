//! # Driven Ports (Outbound SPI)

use chrono::{DateTime, Utc};

/// Abstract interface for time-related operations.
///
/// Enables deterministic testing by injecting controllable time sources.
/// Production uses [`SystemTimeSource`](crate::adapters::SystemTimeSource).
pub trait TimeSource: Send + Sync {
    /// Get the current time.
    fn now(&self) -> DateTime<Utc>;
}
