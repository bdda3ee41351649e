//! Append-only transaction ledger records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransactionKind {
    Buy,
    Sell,
}

/// One executed trade. Records are never mutated after creation; they are
/// the sole source for achievement and audit computations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: u64,
    pub kind: TransactionKind,
    pub token_id: u64,
    pub user_id: u64,
    pub fractions: f64,
    /// Effective price per fraction at execution
    pub price_per_fraction: f64,
    /// Total currency moved (spent on buys, net credited on sells)
    pub total_eur: f64,
    pub executed_at: DateTime<Utc>,
    /// Set on forced month-end sells
    pub is_liquidation: bool,
}
