//! What travels, and what comes back.

use shared_types::{Channel, EntitySnapshot, ProtocolVersion};
use std::net::IpAddr;
use uuid::Uuid;
use vv_03_migration_wire::WrapperState;

use super::errors::MigrationFailure;

/// An organism leaving or arriving: its sealed state plus wrapper values.
#[derive(Debug, Clone, PartialEq)]
pub struct Migrant {
    pub snapshot: EntitySnapshot,
    pub wrapper: WrapperState,
}

impl Migrant {
    /// Wrap a snapshot, sealing it.
    pub fn new(snapshot: EntitySnapshot) -> Self {
        Self {
            snapshot: snapshot.sealed(),
            wrapper: WrapperState::new(),
        }
    }

    pub fn with_wrapper(mut self, wrapper: WrapperState) -> Self {
        self.wrapper = wrapper;
        self
    }
}

/// Identity this instance presents to peers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentity {
    pub world_id: Uuid,
    pub version: ProtocolVersion,
    pub channel: Channel,
}

impl NodeIdentity {
    pub fn new(world_id: Uuid, channel: Channel) -> Self {
        Self {
            world_id,
            version: ProtocolVersion::current(),
            channel,
        }
    }
}

/// Handshake states, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationStep {
    QueryVersion,
    CheckCompatibility,
    CheckPackagePresence,
    UploadPackageIfAbsent,
    UploadEntityState,
    Success,
}

/// Details of an accepted delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// The package was sent during this handshake.
    pub package_uploaded: bool,
    /// The destination already held the package when the state arrived.
    pub assembly_received: bool,
}

/// Terminal result of one handshake.
#[derive(Debug)]
pub enum MigrationOutcome {
    Delivered(Delivery),
    /// The organism did not leave; the caller must put it back.
    Returned {
        migrant: Migrant,
        failure: MigrationFailure,
    },
}

/// What a remote dispatch resolves to once the organism is settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub destination: IpAddr,
    pub result: Result<Delivery, MigrationFailure>,
}
