//! A minimal in-process engine: a bag of resident organisms.

use parking_lot::Mutex;
use shared_types::PackageName;
use std::collections::{BTreeMap, VecDeque};
use tracing::debug;

use crate::domain::Migrant;
use crate::ports::LocalEngine;

/// Arrivals held at most while their package is missing.
pub const DEFAULT_AWAITING_CAPACITY: usize = 64;

/// Resident organisms plus arrivals waiting for their package.
///
/// Waiting organisms join the residents once their package is installed.
/// The waiting queue is bounded; when full, the oldest arrival is dropped.
#[derive(Debug)]
pub struct InMemoryEngine {
    residents: Mutex<Vec<Migrant>>,
    awaiting_package: Mutex<VecDeque<Migrant>>,
    awaiting_capacity: usize,
}

impl Default for InMemoryEngine {
    fn default() -> Self {
        Self::with_awaiting_capacity(DEFAULT_AWAITING_CAPACITY)
    }
}

impl InMemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_awaiting_capacity(capacity: usize) -> Self {
        Self {
            residents: Mutex::new(Vec::new()),
            awaiting_package: Mutex::new(VecDeque::new()),
            awaiting_capacity: capacity,
        }
    }

    pub fn insert(&self, migrant: Migrant) {
        self.residents.lock().push(migrant);
    }

    /// Take the oldest resident out of the world, e.g. to migrate it.
    pub fn take_resident(&self) -> Option<Migrant> {
        let mut residents = self.residents.lock();
        if residents.is_empty() {
            None
        } else {
            Some(residents.remove(0))
        }
    }

    pub fn residents(&self) -> Vec<Migrant> {
        self.residents.lock().clone()
    }

    pub fn awaiting_package(&self) -> Vec<Migrant> {
        self.awaiting_package.lock().iter().cloned().collect()
    }

    fn park(&self, migrant: Migrant) {
        if self.awaiting_capacity == 0 {
            debug!(id = %migrant.snapshot.id(), "package missing, organism dropped");
            return;
        }
        let mut waiting = self.awaiting_package.lock();
        while waiting.len() >= self.awaiting_capacity {
            if let Some(dropped) = waiting.pop_front() {
                debug!(id = %dropped.snapshot.id(), "waiting queue full, organism dropped");
            }
        }
        waiting.push_back(migrant);
    }
}

impl LocalEngine for InMemoryEngine {
    fn reinsert(&self, migrant: Migrant) {
        debug!(id = %migrant.snapshot.id(), "organism reinserted locally");
        self.insert(migrant);
    }

    fn receive_migration(&self, migrant: Migrant, package_present: bool) {
        debug!(id = %migrant.snapshot.id(), package_present, "organism arrived");
        if package_present {
            self.insert(migrant);
        } else {
            self.park(migrant);
        }
    }

    fn package_installed(&self, package: &PackageName) -> usize {
        let key = package.short_name();
        let ready: Vec<Migrant> = {
            let mut waiting = self.awaiting_package.lock();
            let (ready, still_waiting): (VecDeque<Migrant>, VecDeque<Migrant>) = waiting
                .drain(..)
                .partition(|m: &Migrant| m.snapshot.species().package.short_name() == key);
            *waiting = still_waiting;
            ready.into()
        };
        let released = ready.len();
        if released > 0 {
            debug!(package = %package, released, "waiting organisms released");
            self.residents.lock().extend(ready);
        }
        released
    }

    fn population(&self) -> BTreeMap<String, u64> {
        let mut counts = BTreeMap::new();
        for migrant in self.residents.lock().iter() {
            if migrant.snapshot.is_alive() {
                *counts
                    .entry(migrant.snapshot.species().name.clone())
                    .or_insert(0) += 1;
            }
        }
        counts
    }
}
