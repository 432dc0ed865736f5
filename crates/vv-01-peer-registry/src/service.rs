//! # Peer Registry Service
//!
//! Thread-safe façade over [`PeerTable`]. One `parking_lot::Mutex` covers
//! both the known-good map and the blacklist; every method that reads or
//! writes either map takes that lock, so there is no lock ordering to get
//! wrong.
//!
//! The registry is an explicit service object: the discovery loop, the
//! migration coordinator and the inbound handler each hold an
//! `Arc<PeerRegistry>`.

mod core;


pub use self::core::PeerRegistry;
