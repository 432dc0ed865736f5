use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rand::Rng;
use std::net::IpAddr;
use tracing::{debug, info};

use crate::domain::{
    AdmissionError, PeerLease, PeerTable, ReceiptClaim, RegistryConfig, RegistryError,
    RegistryReport,
};
use crate::ports::TimeSource;

/// Known-good peers and the bounded blacklist.
///
/// # Example
///
/// ```rust
/// use std::net::IpAddr;
/// use vv_01_peer_registry::{PeerLease, PeerRegistry, RegistryConfig, SystemTimeSource};
///
/// let registry = PeerRegistry::new(RegistryConfig::default(), Box::new(SystemTimeSource::new()));
/// let peer: IpAddr = "10.0.0.2".parse().unwrap();
/// registry.replace_known_good([PeerLease::new(peer, chrono::Utc::now())]);
///
/// assert_eq!(registry.pick_random(), Ok(peer));
/// registry.demote(&peer);
/// assert!(registry.is_blacklisted(&peer));
/// ```
pub struct PeerRegistry {
    table: Mutex<PeerTable>,
    config: RegistryConfig,
    time_source: Box<dyn TimeSource>,
}

impl PeerRegistry {
    pub fn new(config: RegistryConfig, time_source: Box<dyn TimeSource>) -> Self {
        Self {
            table: Mutex::new(PeerTable::new()),
            config,
            time_source,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.time_source.now()
    }

    /// True iff `address` is blacklisted. Always false in demo mode.
    pub fn is_blacklisted(&self, address: &IpAddr) -> bool {
        if self.config.demo_mode {
            return false;
        }
        self.table.lock().is_blacklisted(address)
    }

    /// True iff `address` is known-good and has not delivered within the
    /// throttle window. Always true in demo mode.
    pub fn should_accept(&self, address: &IpAddr) -> bool {
        if self.config.demo_mode {
            return true;
        }
        let now = self.now();
        self.table
            .lock()
            .should_accept(address, now, self.config.receive_throttle())
    }

    /// Stamp the last receipt time of a known-good peer. No-op otherwise.
    pub fn record_receipt(&self, address: &IpAddr) {
        let now = self.now();
        self.table.lock().record_receipt(address, now);
    }

    /// Blacklist check, throttle check and receipt stamp in one critical
    /// section.
    ///
    /// Two near-simultaneous deliveries from the same peer cannot both pass:
    /// the first one to take the lock claims the window. A delivery that
    /// fails afterwards gives the window back with
    /// [`release_claim`](Self::release_claim).
    pub fn admit(&self, address: &IpAddr) -> Result<ReceiptClaim, AdmissionError> {
        let now = self.now();
        let mut table = self.table.lock();

        if !self.config.demo_mode {
            gate(&table, address, now, self.config.receive_throttle())?;
        }
        Ok(table.claim_receipt(address, now).unwrap_or(ReceiptClaim {
            address: *address,
            previous: None,
            stamped: now,
        }))
    }

    /// Restore the receipt time `claim` replaced. A no-op when the peer has
    /// since left the known-good set or delivered again.
    pub fn release_claim(&self, claim: ReceiptClaim) {
        if self.table.lock().release_claim(&claim) {
            debug!(peer = %claim.address, "receive window released");
        }
    }

    /// Non-recording variant of [`admit`](Self::admit) that reports why a
    /// sender would be refused.
    pub fn check_admission(&self, address: &IpAddr) -> Result<(), AdmissionError> {
        if self.config.demo_mode {
            return Ok(());
        }
        let now = self.now();
        gate(&self.table.lock(), address, now, self.config.receive_throttle())
    }

    /// Move `address` to the blacklist with its lease pushed out by the
    /// demotion penalty. Static peers are never demoted.
    pub fn demote(&self, address: &IpAddr) {
        if self.config.static_discovery {
            debug!(peer = %address, "static discovery active, not demoting");
            return;
        }
        let moved = self
            .table
            .lock()
            .demote(address, self.config.demotion_penalty());
        if moved {
            info!(peer = %address, "peer demoted to blacklist");
        }
    }

    /// See [`PeerTable::reinstate_if_fresher`].
    pub fn reinstate_if_fresher(&self, address: &IpAddr, candidate: DateTime<Utc>) -> bool {
        let (free, released) = {
            let mut table = self.table.lock();
            let was_blacklisted = table.is_blacklisted(address);
            let free = table.reinstate_if_fresher(address, candidate);
            (free, was_blacklisted && free)
        };
        if released {
            info!(peer = %address, lease = %candidate, "peer reinstated from blacklist");
        }
        free
    }

    /// Evict oldest-lease blacklist entries down to the configured bound.
    pub fn truncate_blacklist(&self) -> usize {
        let evicted = self
            .table
            .lock()
            .truncate_blacklist(self.config.max_blacklist);
        if !evicted.is_empty() {
            debug!(count = evicted.len(), "truncated blacklist");
        }
        evicted.len()
    }

    /// Uniformly pick one known-good peer.
    pub fn pick_random(&self) -> Result<IpAddr, RegistryError> {
        self.pick_random_with(&mut rand::thread_rng())
    }

    /// [`pick_random`](Self::pick_random) with a caller-supplied RNG.
    pub fn pick_random_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<IpAddr, RegistryError> {
        self.table
            .lock()
            .pick_random(rng)
            .ok_or(RegistryError::NoKnownPeers)
    }

    /// Replace the known-good set with a fresh discovery snapshot.
    pub fn replace_known_good(&self, peers: impl IntoIterator<Item = PeerLease>) {
        self.table.lock().replace_known_good(peers);
    }

    /// Move every blacklisted peer back to known-good.
    pub fn clear_blacklist(&self) -> usize {
        let restored = self.table.lock().clear_blacklist();
        if restored > 0 {
            info!(count = restored, "blacklist cleared");
        }
        restored
    }

    pub fn is_known_good(&self, address: &IpAddr) -> bool {
        self.table.lock().is_known_good(address)
    }

    pub fn known_good_addresses(&self) -> Vec<IpAddr> {
        self.table.lock().known_good_addresses()
    }

    pub fn has_known_peers(&self) -> bool {
        self.table.lock().report().known_good > 0
    }

    pub fn report(&self) -> RegistryReport {
        self.table.lock().report()
    }
}

fn gate(
    table: &PeerTable,
    address: &IpAddr,
    now: DateTime<Utc>,
    window: chrono::Duration,
) -> Result<(), AdmissionError> {
    if table.is_blacklisted(address) {
        return Err(AdmissionError::Blacklisted(*address));
    }
    if !table.is_known_good(address) {
        return Err(AdmissionError::Unknown(*address));
    }
    if !table.should_accept(address, now, window) {
        return Err(AdmissionError::Throttled(*address));
    }
    Ok(())
}

impl std::fmt::Debug for PeerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerRegistry")
            .field("config", &self.config)
            .field("report", &self.report())
            .finish()
    }
}
