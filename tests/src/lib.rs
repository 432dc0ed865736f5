//! # Vivarium Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── harness.rs          # Live nodes on loopback addresses
//!     ├── migration_flows.rs  # Handshake scenarios between two nodes
//!     └── node_runtime.rs     # Full runtimes with static peer lists
//! ```
//!
//! Nodes share one port and are told apart by address (`127.0.0.1`,
//! `127.0.0.2`, ...), so the whole `127.0.0.0/8` block must route to
//! loopback, as it does on Linux.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p vv-tests
//! cargo bench -p vv-tests
//! ```

pub mod integration;
