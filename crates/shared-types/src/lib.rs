//! # Shared Types Crate
//!
//! Types that cross crate boundaries in the migration subsystem.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: the organism snapshot, its species reference
//!   and the code package name are defined once, here.
//! - **Sealed Snapshots**: an [`EntitySnapshot`] rejects every write once
//!   sealed. Only sealed snapshots may leave the process.
//! - **Compatibility Key**: two peers exchange organisms only when their
//!   [`ProtocolVersion`] and [`Channel`] agree.

pub mod entities;
pub mod errors;
pub mod protocol;

pub use entities::*;
pub use errors::*;
pub use protocol::*;
