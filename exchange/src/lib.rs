//! Markt Exchange
//!
//! Trade settlement against the bonding curve:
//! - buy/sell/creator-grant settlement (TransactionProcessor)
//! - the admin liquidity buffer skimmed from every buy
//! - seasonal and time-boxed price boosts, with the hourly expiry sweep
//! - admin token management (create, activate, curve edits)
//!
//! Every supply-touching operation runs inside the store's per-token
//! critical section, so concurrent trades on one token never interleave.

pub mod admin;
pub mod boosts;
pub mod buffer;
pub mod processor;

pub use admin::TokenAdmin;
pub use boosts::BoostManager;
pub use buffer::{AdminBufferManager, ConsolidationReceipt};
pub use processor::{BuyReceipt, GrantReceipt, SellReceipt, TransactionProcessor};
