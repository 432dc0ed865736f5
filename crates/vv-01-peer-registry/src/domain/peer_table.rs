//! The two peer maps.
//!
//! A peer lives in `known_good` or in `blacklist`, never both. Every method
//! takes the current time as an argument; the service layer owns the clock
//! and the lock.

use chrono::{DateTime, Duration, Utc};
use rand::seq::IteratorRandom;
use rand::Rng;
use std::collections::HashMap;
use std::net::IpAddr;

use super::peer::{Peer, PeerLease, ReceiptClaim, RegistryReport};

#[derive(Debug, Clone, Default)]
pub struct PeerTable {
    known_good: HashMap<IpAddr, Peer>,
    blacklist: HashMap<IpAddr, Peer>,
}

impl PeerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_known_good(&self, address: &IpAddr) -> bool {
        self.known_good.contains_key(address)
    }

    pub fn is_blacklisted(&self, address: &IpAddr) -> bool {
        self.blacklist.contains_key(address)
    }

    pub fn known_good(&self, address: &IpAddr) -> Option<&Peer> {
        self.known_good.get(address)
    }

    pub fn blacklisted(&self, address: &IpAddr) -> Option<&Peer> {
        self.blacklist.get(address)
    }

    /// Known-good and outside the throttle window.
    ///
    /// A peer that never delivered passes.
    pub fn should_accept(&self, address: &IpAddr, now: DateTime<Utc>, window: Duration) -> bool {
        match self.known_good.get(address) {
            Some(peer) => match peer.last_receipt {
                None => true,
                Some(last) => last + window < now,
            },
            None => false,
        }
    }

    /// Returns false when the peer is not known-good.
    pub fn record_receipt(&mut self, address: &IpAddr, now: DateTime<Utc>) -> bool {
        match self.known_good.get_mut(address) {
            Some(peer) => {
                peer.last_receipt = Some(now);
                true
            }
            None => false,
        }
    }

    /// Stamp the receipt time and return what it replaced. `None` when the
    /// peer is not known-good.
    pub fn claim_receipt(
        &mut self,
        address: &IpAddr,
        now: DateTime<Utc>,
    ) -> Option<ReceiptClaim> {
        let peer = self.known_good.get_mut(address)?;
        let previous = peer.last_receipt.replace(now);
        Some(ReceiptClaim {
            address: *address,
            previous,
            stamped: now,
        })
    }

    /// Undo `claim` if the receipt time is still the one it wrote.
    pub fn release_claim(&mut self, claim: &ReceiptClaim) -> bool {
        match self.known_good.get_mut(&claim.address) {
            Some(peer) if peer.last_receipt == Some(claim.stamped) => {
                peer.last_receipt = claim.previous;
                true
            }
            _ => false,
        }
    }

    /// Move a known-good peer to the blacklist, extending its lease by
    /// `penalty`. Returns false if there was nothing to move.
    pub fn demote(&mut self, address: &IpAddr, penalty: Duration) -> bool {
        if self.blacklist.contains_key(address) {
            self.known_good.remove(address);
            return false;
        }
        match self.known_good.remove(address) {
            Some(mut peer) => {
                peer.lease = peer.lease + penalty;
                self.blacklist.insert(*address, peer);
                true
            }
            None => false,
        }
    }

    /// True when the address is free to be known-good under `candidate`.
    ///
    /// A blacklisted address is released only when `candidate` is strictly
    /// newer than the lease it was blacklisted with.
    pub fn reinstate_if_fresher(&mut self, address: &IpAddr, candidate: DateTime<Utc>) -> bool {
        match self.blacklist.get(address) {
            None => true,
            Some(entry) if entry.lease < candidate => {
                self.blacklist.remove(address);
                true
            }
            Some(_) => false,
        }
    }

    /// Evict smallest-lease entries until at most `bound` remain.
    /// Returns the evicted addresses.
    pub fn truncate_blacklist(&mut self, bound: usize) -> Vec<IpAddr> {
        if self.blacklist.len() <= bound {
            return Vec::new();
        }
        let mut by_lease: Vec<(DateTime<Utc>, IpAddr)> = self
            .blacklist
            .values()
            .map(|peer| (peer.lease, peer.address))
            .collect();
        by_lease.sort();

        let excess = self.blacklist.len() - bound;
        let evicted: Vec<IpAddr> = by_lease
            .into_iter()
            .take(excess)
            .map(|(_, address)| address)
            .collect();
        for address in &evicted {
            self.blacklist.remove(address);
        }
        evicted
    }

    /// Replace the known-good set with `peers`.
    ///
    /// Receipt times survive for peers present in both the old and new set,
    /// so a refresh cannot be used to reset a sender's throttle. Addresses
    /// that are blacklisted are skipped.
    pub fn replace_known_good(&mut self, peers: impl IntoIterator<Item = PeerLease>) {
        let mut refreshed = HashMap::new();
        for lease in peers {
            if self.blacklist.contains_key(&lease.address) {
                continue;
            }
            let mut peer = Peer::from(lease);
            if let Some(previous) = self.known_good.get(&lease.address) {
                peer.last_receipt = previous.last_receipt;
            }
            refreshed.insert(lease.address, peer);
        }
        self.known_good = refreshed;
    }

    /// Move every blacklisted peer back to known-good.
    pub fn clear_blacklist(&mut self) -> usize {
        let count = self.blacklist.len();
        for (address, peer) in self.blacklist.drain() {
            self.known_good.insert(address, peer);
        }
        count
    }

    /// Uniform choice among known-good peers.
    pub fn pick_random<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<IpAddr> {
        self.known_good.keys().copied().choose(rng)
    }

    pub fn known_good_addresses(&self) -> Vec<IpAddr> {
        self.known_good.keys().copied().collect()
    }

    pub fn blacklisted_addresses(&self) -> Vec<IpAddr> {
        self.blacklist.keys().copied().collect()
    }

    /// Put a peer straight into the blacklist. Used when seeding from a
    /// persisted state or in tests.
    pub fn insert_blacklisted(&mut self, peer: Peer) {
        self.known_good.remove(&peer.address);
        self.blacklist.insert(peer.address, peer);
    }

    pub fn report(&self) -> RegistryReport {
        RegistryReport {
            known_good: self.known_good.len(),
            blacklisted: self.blacklist.len(),
        }
    }
}
