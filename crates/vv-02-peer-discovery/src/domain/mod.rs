//! Domain Layer - configuration, static peer lists and refresh status

pub mod config;
pub mod errors;
pub mod static_list;
pub mod status;

pub use config::*;
pub use errors::*;
pub use static_list::*;
pub use status::*;
