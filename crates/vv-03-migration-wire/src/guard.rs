//! Type allow-list consulted for every type resolved during decode.
//!
//! Every tagged value in an inbound stream names an `(origin, type name)`
//! pair. The pair is looked up in [`ALLOW_LIST`]; a hit yields an
//! [`AllowedType`] which selects the concrete Rust type the bytes are then
//! decoded into. A miss fails the decode before the body is read.
//!
//! The table is fixed at compile time and partitioned by trust domain:
//!
//! - **Entity**: organism state types from the engine's own crates
//! - **Primitive**: identifiers and scalar values
//! - **Geometry**: points and movement vectors
//!
//! Nothing from file I/O, process control, reflection or any origin outside
//! the three above can ever resolve.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;
use tracing::warn;

use crate::domain::SecurityViolation;

/// Origin of engine and organism state types.
pub const ENTITY_ORIGIN: &str = "vivarium-organism";

/// Origin of geometry value types.
pub const GEOMETRY_ORIGIN: &str = "vivarium-geometry";

/// Origin of scalar value types.
pub const CORE_ORIGIN: &str = "core";

/// Origin of identifier types.
pub const UUID_ORIGIN: &str = "uuid";

/// Trust domain an allow-list entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrustDomain {
    Entity,
    Primitive,
    Geometry,
}

/// Closed set of types a peer may cause us to materialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllowedType {
    MigrationMessage,
    EntitySnapshot,
    WrapperState,
    PendingAction,
    Uuid,
    Text,
    Integer,
    Float,
    Boolean,
    Point,
    MovementVector,
}

/// `(origin, type name)` as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeTag {
    pub origin: String,
    pub name: String,
}

impl TypeTag {
    pub fn new(origin: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.origin, self.name)
    }
}

/// One allow-list row.
#[derive(Debug, Clone, Copy)]
pub struct AllowEntry {
    pub origin: &'static str,
    pub name: &'static str,
    pub domain: TrustDomain,
    pub ty: AllowedType,
}

impl AllowEntry {
    const fn entity(name: &'static str, ty: AllowedType) -> Self {
        Self {
            origin: ENTITY_ORIGIN,
            name,
            domain: TrustDomain::Entity,
            ty,
        }
    }

    const fn primitive(origin: &'static str, name: &'static str, ty: AllowedType) -> Self {
        Self {
            origin,
            name,
            domain: TrustDomain::Primitive,
            ty,
        }
    }

    const fn geometry(name: &'static str, ty: AllowedType) -> Self {
        Self {
            origin: GEOMETRY_ORIGIN,
            name,
            domain: TrustDomain::Geometry,
            ty,
        }
    }

    pub fn tag(&self) -> TypeTag {
        TypeTag::new(self.origin, self.name)
    }
}

/// The allow-list rows. Append only.
pub const ALLOW_ENTRIES: &[AllowEntry] = &[
    // --- Entity ---
    AllowEntry::entity("MigrationMessage", AllowedType::MigrationMessage),
    AllowEntry::entity("EntitySnapshot", AllowedType::EntitySnapshot),
    AllowEntry::entity("WrapperState", AllowedType::WrapperState),
    AllowEntry::entity("PendingAction", AllowedType::PendingAction),
    // --- Primitive ---
    AllowEntry::primitive(UUID_ORIGIN, "Uuid", AllowedType::Uuid),
    AllowEntry::primitive(CORE_ORIGIN, "String", AllowedType::Text),
    AllowEntry::primitive(CORE_ORIGIN, "i64", AllowedType::Integer),
    AllowEntry::primitive(CORE_ORIGIN, "f64", AllowedType::Float),
    AllowEntry::primitive(CORE_ORIGIN, "bool", AllowedType::Boolean),
    // --- Geometry ---
    AllowEntry::geometry("Point", AllowedType::Point),
    AllowEntry::geometry("MovementVector", AllowedType::MovementVector),
];

/// Lookup table built from [`ALLOW_ENTRIES`], keyed by origin then name.
pub static ALLOW_LIST: LazyLock<HashMap<&'static str, HashMap<&'static str, AllowEntry>>> =
    LazyLock::new(|| {
        let mut table: HashMap<&'static str, HashMap<&'static str, AllowEntry>> = HashMap::new();
        for entry in ALLOW_ENTRIES {
            table
                .entry(entry.origin)
                .or_default()
                .insert(entry.name, *entry);
        }
        table
    });

/// Canonical wire tag of an allowed type.
pub fn tag_of(ty: AllowedType) -> TypeTag {
    ALLOW_ENTRIES
        .iter()
        .find(|entry| entry.ty == ty)
        .map(AllowEntry::tag)
        .unwrap_or_else(|| TypeTag::new("", ""))
}

/// Sole authority for resolving a type named by an inbound stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeserializationGuard;

impl DeserializationGuard {
    pub fn new() -> Self {
        Self
    }

    /// Resolve `(origin, name)` to an allowed type, or fail.
    ///
    /// Matching is exact: no case folding, no prefix matching, no fallback.
    pub fn resolve(&self, origin: &str, name: &str) -> Result<AllowedType, SecurityViolation> {
        match ALLOW_LIST.get(origin).and_then(|names| names.get(name)) {
            Some(entry) => Ok(entry.ty),
            None => {
                warn!(origin = %origin, type_name = %name, "rejected type outside allow-list");
                Err(SecurityViolation {
                    origin: origin.to_string(),
                    type_name: name.to_string(),
                })
            }
        }
    }

    pub fn resolve_tag(&self, tag: &TypeTag) -> Result<AllowedType, SecurityViolation> {
        self.resolve(&tag.origin, &tag.name)
    }

    /// Rows of one trust domain.
    pub fn entries(&self, domain: TrustDomain) -> impl Iterator<Item = &'static AllowEntry> {
        ALLOW_ENTRIES.iter().filter(move |entry| entry.domain == domain)
    }
}
