//! Adapters Layer - HTTP discovery client and system interfaces

pub mod http;
pub mod interfaces;

pub use http::HttpDiscoveryClient;
pub use interfaces::SystemInterfaces;
