//! Market error types

use thiserror::Error;

/// Errors raised by the pricing engine, trade settlement and lifecycle jobs
#[derive(Error, Debug)]
pub enum MarketError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Insufficient funds: requested {requested:.4}, available {available:.4}")]
    InsufficientFunds { requested: f64, available: f64 },

    #[error("Insufficient position: requested {requested:.4} fractions, held {held:.4}")]
    InsufficientPosition { requested: f64, held: f64 },

    #[error("Token is not active: {0}")]
    InactiveToken(u64),

    #[error("Token not found: {0}")]
    TokenNotFound(u64),

    #[error("Ticker already registered: {0}")]
    DuplicateTicker(String),

    #[error("User not found: {0}")]
    UserNotFound(u64),

    #[error("Admin buffer for token {0} is empty")]
    EmptyBuffer(u64),

    #[error("Concurrent update lost on token {0}")]
    ConcurrencyConflict(u64),

    #[error("Lifecycle invariant violated: {0}")]
    Lifecycle(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, MarketError>;
