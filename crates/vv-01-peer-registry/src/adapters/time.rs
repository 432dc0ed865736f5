use chrono::{DateTime, Utc};

use crate::ports::TimeSource;

// ============================================================================
// SystemTimeSource - Production Time Source
// ============================================================================

/// Production time source using the system clock.
///
/// For testing, use `ControllableTimeSource` from the `test-utils` feature.
///
/// # Example
///
/// ```rust
/// use vv_01_peer_registry::adapters::SystemTimeSource;
/// use vv_01_peer_registry::ports::TimeSource;
///
/// let time_source = SystemTimeSource::new();
/// assert!(time_source.now().timestamp() > 0);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl SystemTimeSource {
    /// Create a new system time source.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
