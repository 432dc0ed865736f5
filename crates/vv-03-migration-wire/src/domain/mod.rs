//! Domain Layer - message schema and wire errors

pub mod errors;
pub mod message;
pub mod wrapper;

pub use errors::*;
pub use message::*;
pub use wrapper::*;
