//! Users and portfolio positions

use crate::error::{MarketError, Result};
use crate::month::Month;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    /// Spendable virtual currency, >= 0
    pub balance_eur: f64,
    pub role: Role,
    /// Lifetime best monthly rank (1 is best); only improves
    pub best_position: Option<u32>,
    pub best_position_month: Option<Month>,
    /// Lifetime number of monthly achievements won
    pub achievement_count: u32,
}

impl User {
    pub fn new(id: u64, name: impl Into<String>, balance_eur: f64, role: Role) -> Self {
        User {
            id,
            name: name.into(),
            balance_eur,
            role,
            best_position: None,
            best_position_month: None,
            achievement_count: 0,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Record a monthly rank, keeping only lifetime-best (lower is better)
    pub fn record_rank(&mut self, rank: u32, month: Month) {
        if self.best_position.map_or(true, |best| rank < best) {
            self.best_position = Some(rank);
            self.best_position_month = Some(month);
        }
    }
}

/// An open holding of one user in one token. A position with zero fractions
/// is logically closed and removed from storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub user_id: u64,
    pub token_id: u64,
    pub fractions: f64,
    /// Cumulative cost basis
    pub invested_eur: f64,
    pub average_buy_price: f64,
}

impl Position {
    pub fn new(user_id: u64, token_id: u64) -> Self {
        Position {
            user_id,
            token_id,
            fractions: 0.0,
            invested_eur: 0.0,
            average_buy_price: 0.0,
        }
    }

    /// Add bought fractions and their cost, recomputing the average price
    pub fn apply_buy(&mut self, fractions: f64, cost_eur: f64) {
        self.fractions += fractions;
        self.invested_eur += cost_eur;
        if self.fractions > 0.0 {
            self.average_buy_price = self.invested_eur / self.fractions;
        }
    }

    /// Seed fractions at a reference price without any cost basis
    /// (creator grants)
    pub fn apply_grant(&mut self, fractions: f64, reference_price: f64) {
        self.fractions += fractions;
        if self.invested_eur == 0.0 {
            self.average_buy_price = reference_price;
        }
    }

    /// Remove sold fractions, scaling the cost basis down proportionally so
    /// the average buy price of the remainder is preserved.
    pub fn apply_sell(&mut self, fractions: f64) -> Result<()> {
        if fractions > self.fractions {
            return Err(MarketError::InsufficientPosition {
                requested: fractions,
                held: self.fractions,
            });
        }
        let previous = self.fractions;
        self.fractions -= fractions;
        if self.fractions > 0.0 {
            self.invested_eur *= self.fractions / previous;
        } else {
            self.invested_eur = 0.0;
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.fractions <= 0.0
    }
}
