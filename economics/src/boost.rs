//! Effective-price composition over boosts
//!
//! A token's quoted price is the curve price scaled by its persistent
//! seasonal multiplier, and by the time-boxed boost while one is live.

use crate::curve::BondingCurve;
use chrono::{DateTime, Utc};
use markt_core::{Result, Token};

/// Curve price at the token's current supply, times the seasonal
/// multiplier, times the time-boxed boost value if active at `now`.
pub fn effective_price(token: &Token, now: DateTime<Utc>) -> Result<f64> {
    let base = BondingCurve::price(token.p0, token.k, token.supply)?;
    let boost = match &token.boost {
        Some(b) if token.boost_active_at(now) => b.value,
        _ => 1.0,
    };
    Ok(base * token.seasonal_multiplier * boost)
}
