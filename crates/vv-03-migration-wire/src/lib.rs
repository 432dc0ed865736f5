//! # Migration Wire Format
//!
//! The envelope an organism travels in, and the only path by which bytes
//! from a remote peer become values in this process.
//!
//! ## Security Model
//!
//! Inbound payloads are untrusted. Every type the stream names is resolved
//! through [`DeserializationGuard`] against a fixed allow-list before any
//! bytes are interpreted as that type. The decoded shape is always one of a
//! closed set of Rust types; the type name on the wire selects among them
//! but never introduces a new one.
//!
//! ## Example
//!
//! ```rust
//! use shared_types::{Channel, EntitySnapshot, PackageName, Point, SpeciesKind, SpeciesRef};
//! use uuid::Uuid;
//! use vv_03_migration_wire::{Locale, MigrationMessage, WireCodec};
//!
//! let species = SpeciesRef {
//!     name: "Fern".into(),
//!     package: PackageName::new("Fern, Version=1.0.0.0").unwrap(),
//!     kind: SpeciesKind::Plant,
//! };
//! let snapshot = EntitySnapshot::new(Uuid::new_v4(), species, Point::new(4, 2)).sealed();
//! let message = MigrationMessage::new(
//!     Uuid::new_v4(), snapshot, Vec::new(), Channel::default(), false, Locale::default(),
//! ).unwrap();
//!
//! let codec = WireCodec::default();
//! let bytes = codec.encode_message(&message).unwrap();
//! assert_eq!(codec.decode_message(&bytes).unwrap(), message);
//! ```

pub mod codec;
pub mod domain;
pub mod guard;

pub use codec::{WireCodec, DEFAULT_MAX_FRAME_BYTES, SCHEMA_VERSION};
pub use domain::{
    Locale, MigrationMessage, MovementVector, PendingAction, SecurityViolation, WireError,
    WrapperState, WrapperValue,
};
pub use guard::{AllowedType, DeserializationGuard, TrustDomain, TypeTag};
