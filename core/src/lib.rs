//! Markt Core Library
//!
//! Shared data model for the token market:
//! - Tokens on a linear bonding curve
//! - User balances and portfolio positions
//! - The append-only transaction ledger
//! - Monthly ranking and achievement records

pub mod config;
pub mod error;
pub mod ledger;
pub mod month;
pub mod phase;
pub mod ranking;
pub mod token;
pub mod user;

pub use config::MarketConfig;
pub use error::{MarketError, Result};
pub use ledger::{TransactionKind, TransactionRecord};
pub use month::Month;
pub use phase::{LifecycleCheckpoint, LifecyclePhase};
pub use ranking::{AchievementKind, MonthlyAchievement, MonthlyRankingEntry};
pub use token::{AdminBuffer, TimeBoxedBoost, Token};
pub use user::{Position, Role, User};

/// Economic constants
pub mod constants {
    /// Virtual currency every non-admin user starts each month with
    pub const STARTING_BALANCE_EUR: f64 = 150.0;

    /// Fraction of every buy minted into the token's admin buffer (1%)
    pub const ADMIN_SKIM_RATE: f64 = 0.01;

    /// Haircut applied to sell proceeds (1.5%)
    pub const SELL_SPREAD: f64 = 0.015;

    /// Free fractions granted to a token's creator on approval
    pub const CREATOR_REWARD_FRACTIONS: f64 = 10.0;

    /// Ranking entries persisted per month
    pub const LEADERBOARD_SIZE: usize = 50;

    /// Window after token creation in which a buy counts as "early" (hours)
    pub const EARLY_BIRD_WINDOW_HOURS: i64 = 24;

    /// A sell qualifies for the Sniper award at >= 95% of the monthly peak
    pub const SNIPER_PEAK_RATIO: f64 = 0.95;

    /// Cadence of the time-boxed boost expiry sweep (seconds)
    pub const BOOST_SWEEP_INTERVAL_SECS: u64 = 3600;
}
