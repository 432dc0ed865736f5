//! Versioned, allow-list guarded binary framing.
//!
//! Every payload is a [`Frame`]: magic, schema version, a [`TypeTag`] and an
//! opaque body. Decoding reads the frame header, resolves the tag through
//! the [`DeserializationGuard`], checks it is the type the caller asked for,
//! and only then interprets the body. Nested values (the snapshot, each
//! wrapper entry) are tagged the same way and resolved one by one.
//!
//! All decoding goes through `bincode` with a byte limit, so a hostile
//! length prefix cannot force a large allocation.

use bincode::Options;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shared_types::{Channel, EntitySnapshot, Point};
use uuid::Uuid;

use crate::domain::{
    Locale, MigrationMessage, MovementVector, PendingAction, WireError, WrapperState,
    WrapperValue,
};
use crate::guard::{tag_of, AllowedType, DeserializationGuard, TypeTag};

#[cfg(test)]
mod tests;

/// Leading bytes of every frame.
pub const MAGIC: [u8; 4] = *b"VVMG";

/// Schema version written by this build.
pub const SCHEMA_VERSION: u16 = 1;

/// Default decode limit for one frame.
pub const DEFAULT_MAX_FRAME_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Serialize, Deserialize)]
struct Frame {
    magic: [u8; 4],
    schema: u16,
    tag: TypeTag,
    body: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TaggedValue {
    tag: TypeTag,
    body: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
struct MessageBody {
    originator: Uuid,
    snapshot: TaggedValue,
    serialized_wrapper: Vec<u8>,
    channel: String,
    teleported_to_self: bool,
    locale: Locale,
}

#[derive(Debug, Serialize, Deserialize)]
struct WrapperBody {
    entries: Vec<(String, TaggedValue)>,
}

/// Encoder and guarded decoder for migration payloads.
#[derive(Debug, Clone, Copy)]
pub struct WireCodec {
    guard: DeserializationGuard,
    max_frame_bytes: u64,
}

impl Default for WireCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_BYTES)
    }
}

impl WireCodec {
    pub fn new(max_frame_bytes: u64) -> Self {
        Self {
            guard: DeserializationGuard::new(),
            max_frame_bytes,
        }
    }

    pub fn guard(&self) -> &DeserializationGuard {
        &self.guard
    }

    fn options(&self) -> impl Options {
        bincode::DefaultOptions::new().with_limit(self.max_frame_bytes)
    }

    fn to_bytes<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, WireError> {
        Ok(self.options().serialize(value)?)
    }

    fn from_bytes<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, WireError> {
        Ok(self.options().deserialize(bytes)?)
    }

    fn seal_frame(&self, ty: AllowedType, body: Vec<u8>) -> Result<Vec<u8>, WireError> {
        self.to_bytes(&Frame {
            magic: MAGIC,
            schema: SCHEMA_VERSION,
            tag: tag_of(ty),
            body,
        })
    }

    /// Validate the frame header and return its body.
    fn open_frame(&self, bytes: &[u8], expected: AllowedType) -> Result<Vec<u8>, WireError> {
        let frame: Frame = self.from_bytes(bytes)?;
        if frame.magic != MAGIC {
            return Err(WireError::BadMagic);
        }
        if frame.schema != SCHEMA_VERSION {
            return Err(WireError::UnsupportedSchema {
                found: frame.schema,
                expected: SCHEMA_VERSION,
            });
        }
        self.expect(&frame.tag, expected)?;
        Ok(frame.body)
    }

    fn expect(&self, tag: &TypeTag, expected: AllowedType) -> Result<(), WireError> {
        let found = self.guard.resolve_tag(tag)?;
        if found != expected {
            return Err(WireError::UnexpectedType { expected, found });
        }
        Ok(())
    }

    fn tagged<T: Serialize>(&self, ty: AllowedType, value: &T) -> Result<TaggedValue, WireError> {
        Ok(TaggedValue {
            tag: tag_of(ty),
            body: self.to_bytes(value)?,
        })
    }

    // =========================================================================
    // MIGRATION MESSAGE
    // =========================================================================

    pub fn encode_message(&self, message: &MigrationMessage) -> Result<Vec<u8>, WireError> {
        let body = MessageBody {
            originator: message.originator(),
            snapshot: self.tagged(AllowedType::EntitySnapshot, message.snapshot())?,
            serialized_wrapper: message.serialized_wrapper().to_vec(),
            channel: message.channel().as_str().to_string(),
            teleported_to_self: message.teleported_to_self(),
            locale: message.locale().clone(),
        };
        let body = self.to_bytes(&body)?;
        self.seal_frame(AllowedType::MigrationMessage, body)
    }

    /// Decode an inbound message. The wrapper payload is validated too, so a
    /// disallowed type anywhere in the stream fails the whole decode.
    pub fn decode_message(&self, bytes: &[u8]) -> Result<MigrationMessage, WireError> {
        self.decode_delivery(bytes).map(|(message, _)| message)
    }

    /// [`decode_message`](Self::decode_message), also returning the wrapper
    /// state it decoded along the way.
    pub fn decode_delivery(
        &self,
        bytes: &[u8],
    ) -> Result<(MigrationMessage, WrapperState), WireError> {
        let body = self.open_frame(bytes, AllowedType::MigrationMessage)?;
        let body: MessageBody = self.from_bytes(&body)?;

        self.expect(&body.snapshot.tag, AllowedType::EntitySnapshot)?;
        let snapshot: EntitySnapshot = self.from_bytes(&body.snapshot.body)?;

        let wrapper = self.decode_wrapper(&body.serialized_wrapper)?;

        let message = MigrationMessage::new(
            body.originator,
            snapshot.sealed(),
            body.serialized_wrapper,
            Channel::new(body.channel),
            body.teleported_to_self,
            body.locale,
        )?;
        Ok((message, wrapper))
    }

    // =========================================================================
    // WRAPPER STATE
    // =========================================================================

    pub fn encode_wrapper(&self, state: &WrapperState) -> Result<Vec<u8>, WireError> {
        let mut entries = Vec::with_capacity(state.len());
        for (key, value) in state.iter() {
            let ty = value.allowed_type();
            let tagged = match value {
                WrapperValue::Id(v) => self.tagged(ty, v)?,
                WrapperValue::Text(v) => self.tagged(ty, v)?,
                WrapperValue::Integer(v) => self.tagged(ty, v)?,
                WrapperValue::Float(v) => self.tagged(ty, v)?,
                WrapperValue::Boolean(v) => self.tagged(ty, v)?,
                WrapperValue::Point(v) => self.tagged(ty, v)?,
                WrapperValue::Vector(v) => self.tagged(ty, v)?,
                WrapperValue::Action(v) => self.tagged(ty, v)?,
            };
            entries.push((key.to_string(), tagged));
        }
        let body = self.to_bytes(&WrapperBody { entries })?;
        self.seal_frame(AllowedType::WrapperState, body)
    }

    /// Decode a wrapper payload. An empty payload is an empty state.
    pub fn decode_wrapper(&self, bytes: &[u8]) -> Result<WrapperState, WireError> {
        if bytes.is_empty() {
            return Ok(WrapperState::new());
        }
        let body = self.open_frame(bytes, AllowedType::WrapperState)?;
        let body: WrapperBody = self.from_bytes(&body)?;

        let mut state = WrapperState::new();
        for (key, tagged) in body.entries {
            let value = self.decode_value(&tagged)?;
            state.set(key, value);
        }
        Ok(state)
    }

    fn decode_value(&self, tagged: &TaggedValue) -> Result<WrapperValue, WireError> {
        let ty = self.guard.resolve_tag(&tagged.tag)?;
        let bytes = tagged.body.as_slice();
        let value = match ty {
            AllowedType::Uuid => WrapperValue::Id(self.from_bytes::<Uuid>(bytes)?),
            AllowedType::Text => WrapperValue::Text(self.from_bytes::<String>(bytes)?),
            AllowedType::Integer => WrapperValue::Integer(self.from_bytes::<i64>(bytes)?),
            AllowedType::Float => WrapperValue::Float(self.from_bytes::<f64>(bytes)?),
            AllowedType::Boolean => WrapperValue::Boolean(self.from_bytes::<bool>(bytes)?),
            AllowedType::Point => WrapperValue::Point(self.from_bytes::<Point>(bytes)?),
            AllowedType::MovementVector => {
                WrapperValue::Vector(self.from_bytes::<MovementVector>(bytes)?)
            }
            AllowedType::PendingAction => {
                WrapperValue::Action(self.from_bytes::<PendingAction>(bytes)?)
            }
            found @ (AllowedType::MigrationMessage
            | AllowedType::EntitySnapshot
            | AllowedType::WrapperState) => return Err(WireError::NotAValue(found)),
        };
        Ok(value)
    }
}
