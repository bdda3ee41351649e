//! Monthly ranking snapshots and achievements

use crate::month::Month;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of a month's leaderboard. Written once by the month-end
/// snapshot; never recomputed retroactively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyRankingEntry {
    pub month: Month,
    /// 1-based rank
    pub position: u32,
    pub user_id: u64,
    pub balance_eur: f64,
    pub invested_value: f64,
    pub spot_value: f64,
    pub total_value: f64,
    pub gain_percent: f64,
    /// Tie-break timestamp: first-computed wins
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AchievementKind {
    /// Most buys within 24h of token creation
    EarlyBird,
    /// Most transactions overall
    Trader,
    /// Most sells at >= 95% of a token's monthly peak price
    Sniper,
    /// Most tokens bought and never sold within the month
    Hodler,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyAchievement {
    pub month: Month,
    pub kind: AchievementKind,
    pub user_id: u64,
    pub metric: f64,
    pub description: String,
}
