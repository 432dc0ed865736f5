//! Adapters Layer - filesystem cache, HTTP transport, in-memory engine

pub mod fs_cache;
pub mod http_transport;
pub mod memory_engine;

pub use fs_cache::FsPackageCache;
pub use http_transport::HttpPeerTransport;
pub use memory_engine::{InMemoryEngine, DEFAULT_AWAITING_CAPACITY};
