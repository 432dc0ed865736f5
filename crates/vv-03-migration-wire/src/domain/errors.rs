//! Wire errors.

use thiserror::Error;

use crate::guard::AllowedType;

/// A decode named a type outside the allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("type {origin}::{type_name} is not allowed")]
pub struct SecurityViolation {
    pub origin: String,
    pub type_name: String,
}

/// Errors raised while building, encoding or decoding migration payloads.
#[derive(Debug, Error)]
pub enum WireError {
    /// Disallowed type encountered during decode.
    #[error("security violation: {0}")]
    Security(#[from] SecurityViolation),

    /// An allowed type appeared where a different one was required.
    #[error("expected {expected:?}, stream declared {found:?}")]
    UnexpectedType {
        expected: AllowedType,
        found: AllowedType,
    },

    /// A container type was tagged where a wrapper value was required.
    #[error("{0:?} cannot be stored as a wrapper value")]
    NotAValue(AllowedType),

    /// The frame declares a schema version this build does not speak.
    #[error("unsupported schema {found}, expected {expected}")]
    UnsupportedSchema { found: u16, expected: u16 },

    /// The frame does not start with the migration magic bytes.
    #[error("not a migration frame")]
    BadMagic,

    /// A snapshot was not sealed before being placed in a message.
    #[error("snapshot {0} must be sealed before transmission")]
    Unsealed(uuid::Uuid),

    /// Structural decode failure, including size-limit overruns.
    #[error("malformed payload: {0}")]
    Codec(#[from] bincode::Error),
}

impl WireError {
    /// True for allow-list violations.
    pub fn is_security_violation(&self) -> bool {
        matches!(self, WireError::Security(_))
    }
}
