//! Markt Storage Layer
//!
//! In-process store for the market entities with the guarantees the trading
//! engine needs:
//! - per-token critical sections (every supply-touching operation on one
//!   token is serialized)
//! - per-record atomic read-modify-write for users and positions
//! - an append-only transaction ledger with month indexing
//! - file-based snapshots (JSON for readability, bincode for speed) so the
//!   in-memory state survives a process restart

pub mod snapshot;
pub mod store;

pub use snapshot::SnapshotStore;
pub use store::{MarketSnapshot, MarketStore};
