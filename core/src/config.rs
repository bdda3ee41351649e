//! Market configuration (markt.toml) support
//!
//! All fields default to the reference constants, so an empty file (or no
//! file at all) yields the standard market parameters.

use crate::constants;
use crate::error::{MarketError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MarketConfig {
    /// Fraction of every buy minted into the admin buffer
    pub admin_skim_rate: f64,
    /// Haircut on sell proceeds
    pub sell_spread: f64,
    /// Balance every non-admin user is reset to at month end
    pub starting_balance_eur: f64,
    /// Free fractions granted to a token creator on approval
    pub creator_reward_fractions: f64,
    /// Ranking entries persisted per month
    pub leaderboard_size: usize,
    /// Cadence of the boost expiry sweep, in seconds
    pub boost_sweep_interval_secs: u64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        MarketConfig {
            admin_skim_rate: constants::ADMIN_SKIM_RATE,
            sell_spread: constants::SELL_SPREAD,
            starting_balance_eur: constants::STARTING_BALANCE_EUR,
            creator_reward_fractions: constants::CREATOR_REWARD_FRACTIONS,
            leaderboard_size: constants::LEADERBOARD_SIZE,
            boost_sweep_interval_secs: constants::BOOST_SWEEP_INTERVAL_SECS,
        }
    }
}

impl MarketConfig {
    /// Load from a TOML file; missing fields fall back to defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())
            .map_err(|e| MarketError::Storage(format!("read config: {}", e)))?;
        let config: MarketConfig =
            toml::from_str(&raw).map_err(|e| MarketError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.admin_skim_rate) {
            return Err(MarketError::Validation(format!(
                "admin skim rate must be in [0, 1), got {}",
                self.admin_skim_rate
            )));
        }
        if !(0.0..1.0).contains(&self.sell_spread) {
            return Err(MarketError::Validation(format!(
                "sell spread must be in [0, 1), got {}",
                self.sell_spread
            )));
        }
        if self.starting_balance_eur <= 0.0 {
            return Err(MarketError::Validation(
                "starting balance must be positive".to_string(),
            ));
        }
        if self.creator_reward_fractions < 0.0 {
            return Err(MarketError::Validation(
                "creator reward must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let c = MarketConfig::default();
        assert_eq!(c.starting_balance_eur, 150.0);
        assert_eq!(c.admin_skim_rate, 0.01);
        assert_eq!(c.sell_spread, 0.015);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let c: MarketConfig = toml::from_str("sell_spread = 0.02").unwrap();
        assert_eq!(c.sell_spread, 0.02);
        assert_eq!(c.starting_balance_eur, 150.0);
    }

    #[test]
    fn test_validate_rejects_bad_rates() {
        let mut c = MarketConfig::default();
        c.admin_skim_rate = 1.5;
        assert!(c.validate().is_err());
    }
}
