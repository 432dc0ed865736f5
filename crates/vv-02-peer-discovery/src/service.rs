//! Service Layer - the periodic refresh loop

mod core;

pub use self::core::{DiscoveryLoop, PeerSource, RefreshOutcome};
