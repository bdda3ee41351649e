//! Tokens on a linear bonding curve, and their admin liquidity buffers

use crate::error::{MarketError, Result};
use crate::month::Month;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A time-boxed price multiplier. Cleared by the hourly expiry sweep once
/// `expires_at` has passed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeBoxedBoost {
    pub value: f64,
    pub expires_at: DateTime<Utc>,
    pub note: Option<String>,
}

/// A tradeable token. Price is always a pure function of `supply` plus the
/// current multipliers; `supply` only changes through a mint (buy, buffer
/// skim, creator grant) or a burn (sell, consolidation, liquidation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub id: u64,
    pub ticker: String,
    /// Price at zero supply, > 0
    pub p0: f64,
    /// Curve slope, > 0
    pub k: f64,
    /// Circulating fractions, >= 0
    pub supply: f64,
    pub is_active: bool,
    /// Permanent tokens survive the monthly rollover; temporary tokens are
    /// tied to their season and deactivate when it ends.
    pub is_permanent: bool,
    pub season: Option<Month>,
    /// Persistent multiplier, >= 0. Values < 1 model discounts.
    pub seasonal_multiplier: f64,
    pub boost: Option<TimeBoxedBoost>,
    pub created_at: DateTime<Utc>,
}

impl Token {
    pub fn new(
        id: u64,
        ticker: impl Into<String>,
        p0: f64,
        k: f64,
        is_permanent: bool,
        season: Option<Month>,
        created_at: DateTime<Utc>,
    ) -> Result<Self> {
        if p0 <= 0.0 || !p0.is_finite() {
            return Err(MarketError::Validation(format!(
                "base price must be positive, got {}",
                p0
            )));
        }
        if k <= 0.0 || !k.is_finite() {
            return Err(MarketError::Validation(format!(
                "curve slope must be positive, got {}",
                k
            )));
        }
        Ok(Token {
            id,
            ticker: ticker.into(),
            p0,
            k,
            supply: 0.0,
            is_active: true,
            is_permanent,
            season,
            seasonal_multiplier: 1.0,
            boost: None,
            created_at,
        })
    }

    /// True iff a time-boxed boost is set and has not yet expired
    pub fn boost_active_at(&self, now: DateTime<Utc>) -> bool {
        match &self.boost {
            Some(b) => now < b.expires_at,
            None => false,
        }
    }

    pub fn mint(&mut self, fractions: f64) -> Result<()> {
        if fractions < 0.0 || !fractions.is_finite() {
            return Err(MarketError::Validation(format!(
                "mint amount must be non-negative, got {}",
                fractions
            )));
        }
        self.supply += fractions;
        Ok(())
    }

    pub fn burn(&mut self, fractions: f64) -> Result<()> {
        if fractions < 0.0 || !fractions.is_finite() {
            return Err(MarketError::Validation(format!(
                "burn amount must be non-negative, got {}",
                fractions
            )));
        }
        if fractions > self.supply {
            return Err(MarketError::Validation(format!(
                "cannot burn {} fractions from supply {}",
                fractions, self.supply
            )));
        }
        self.supply -= fractions;
        Ok(())
    }
}

/// Per-token liquidity buffer fed by the admin skim on every buy.
/// `consolidated_eur` is the lifetime realized total and never decreases.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AdminBuffer {
    pub token_id: u64,
    pub fractions: f64,
    pub consolidated_eur: f64,
}

impl AdminBuffer {
    pub fn new(token_id: u64) -> Self {
        AdminBuffer {
            token_id,
            fractions: 0.0,
            consolidated_eur: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token() -> Token {
        Token::new(1, "TST", 0.15, 0.00015, true, None, Utc::now()).unwrap()
    }

    #[test]
    fn test_new_rejects_bad_curve() {
        assert!(Token::new(1, "X", 0.0, 0.1, true, None, Utc::now()).is_err());
        assert!(Token::new(1, "X", 0.1, -1.0, true, None, Utc::now()).is_err());
    }

    #[test]
    fn test_mint_burn() {
        let mut t = token();
        t.mint(100.0).unwrap();
        assert_eq!(t.supply, 100.0);
        t.burn(40.0).unwrap();
        assert_eq!(t.supply, 60.0);
        assert!(t.burn(100.0).is_err());
        assert!(t.mint(-1.0).is_err());
    }

    #[test]
    fn test_boost_active_window() {
        let mut t = token();
        let now = Utc::now();
        assert!(!t.boost_active_at(now));
        t.boost = Some(TimeBoxedBoost {
            value: 1.5,
            expires_at: now + Duration::hours(1),
            note: None,
        });
        assert!(t.boost_active_at(now));
        assert!(!t.boost_active_at(now + Duration::hours(2)));
    }
}
