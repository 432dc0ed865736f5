//! The migration envelope.

use serde::{Deserialize, Serialize};
use shared_types::{Channel, EntitySnapshot};
use uuid::Uuid;

use super::errors::WireError;

/// Where the sending instance is located. Informational only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locale {
    pub country: String,
    pub region: String,
}

impl Locale {
    pub fn new(country: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            region: region.into(),
        }
    }
}

/// One organism in transit.
///
/// Built right before transmission, consumed once by the receiver. There are
/// no setters: the snapshot must already be sealed and the remaining fields
/// are fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationMessage {
    originator: Uuid,
    snapshot: EntitySnapshot,
    serialized_wrapper: Vec<u8>,
    channel: Channel,
    teleported_to_self: bool,
    locale: Locale,
}

impl MigrationMessage {
    /// Fails with [`WireError::Unsealed`] if `snapshot` is still writable.
    pub fn new(
        originator: Uuid,
        snapshot: EntitySnapshot,
        serialized_wrapper: Vec<u8>,
        channel: Channel,
        teleported_to_self: bool,
        locale: Locale,
    ) -> Result<Self, WireError> {
        if !snapshot.is_sealed() {
            return Err(WireError::Unsealed(snapshot.id()));
        }
        Ok(Self {
            originator,
            snapshot,
            serialized_wrapper,
            channel,
            teleported_to_self,
            locale,
        })
    }

    /// World id of the sending instance.
    pub fn originator(&self) -> Uuid {
        self.originator
    }

    pub fn snapshot(&self) -> &EntitySnapshot {
        &self.snapshot
    }

    /// Encoded [`WrapperState`](super::WrapperState); decode with
    /// [`WireCodec::decode_wrapper`](crate::WireCodec::decode_wrapper).
    pub fn serialized_wrapper(&self) -> &[u8] {
        &self.serialized_wrapper
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    pub fn teleported_to_self(&self) -> bool {
        self.teleported_to_self
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    /// Consume the message, keeping the snapshot and the wrapper payload.
    pub fn into_parts(self) -> (EntitySnapshot, Vec<u8>) {
        (self.snapshot, self.serialized_wrapper)
    }

    pub fn into_snapshot(self) -> EntitySnapshot {
        self.snapshot
    }
}
