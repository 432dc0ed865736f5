//! # Error Types
//!
//! Errors raised by the shared entity model.

use thiserror::Error;

/// Errors raised when mutating an entity snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    /// The snapshot was sealed for transmission and can no longer change.
    #[error("snapshot {id} is sealed; cannot write field `{field}`")]
    Sealed { id: uuid::Uuid, field: &'static str },
}

/// Errors raised when parsing a code package name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackageNameError {
    /// The name was empty or whitespace only.
    #[error("package name is empty")]
    Empty,

    /// The short name contains characters that are not allowed in a file name.
    #[error("package name `{0}` contains illegal characters")]
    IllegalCharacters(String),

    /// The name exceeds the maximum accepted length.
    #[error("package name is {len} bytes, limit is {max}")]
    TooLong { len: usize, max: usize },
}
