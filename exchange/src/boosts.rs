//! Boost administration and expiry
//!
//! Seasonal multipliers persist until explicitly changed; time-boxed
//! boosts carry an expiry and are cleared by the hourly sweep.

use chrono::{DateTime, Duration, Utc};
use markt_core::{MarketError, Result, TimeBoxedBoost};
use markt_economics::effective_price;
use markt_storage::MarketStore;
use std::sync::Arc;

pub struct BoostManager {
    store: Arc<MarketStore>,
}

impl BoostManager {
    pub fn new(store: Arc<MarketStore>) -> Self {
        BoostManager { store }
    }

    /// Quoted price: curve price at current supply times the active
    /// multipliers.
    pub fn effective_price(&self, token_id: u64, now: DateTime<Utc>) -> Result<f64> {
        let token = self.store.get_token(token_id)?;
        effective_price(&token, now)
    }

    pub fn set_time_boxed_boost(
        &self,
        token_id: u64,
        multiplier: f64,
        duration_hours: i64,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if multiplier <= 0.0 || !multiplier.is_finite() {
            return Err(MarketError::Validation(format!(
                "boost multiplier must be positive, got {}",
                multiplier
            )));
        }
        if duration_hours <= 0 {
            return Err(MarketError::Validation(format!(
                "boost duration must be positive, got {}h",
                duration_hours
            )));
        }
        self.store.with_token(token_id, |store| {
            store.mutate_token(token_id, |t| {
                t.boost = Some(TimeBoxedBoost {
                    value: multiplier,
                    expires_at: now + Duration::hours(duration_hours),
                    note,
                });
                Ok(())
            })
        })?;
        tracing::info!(
            "set {}x boost on token {} for {}h",
            multiplier,
            token_id,
            duration_hours
        );
        Ok(())
    }

    pub fn clear_time_boxed_boost(&self, token_id: u64) -> Result<()> {
        self.store.with_token(token_id, |store| {
            store.mutate_token(token_id, |t| {
                t.boost = None;
                Ok(())
            })
        })
    }

    /// Persistent multiplier; values below 1 model discounts, above 1
    /// demand spikes. Zero is allowed (a free token).
    pub fn set_seasonal_multiplier(
        &self,
        token_id: u64,
        multiplier: f64,
        note: Option<&str>,
    ) -> Result<()> {
        if multiplier < 0.0 || !multiplier.is_finite() {
            return Err(MarketError::Validation(format!(
                "seasonal multiplier must be non-negative, got {}",
                multiplier
            )));
        }
        self.store.with_token(token_id, |store| {
            store.mutate_token(token_id, |t| {
                t.seasonal_multiplier = multiplier;
                Ok(())
            })
        })?;
        tracing::info!(
            "seasonal multiplier of token {} set to {}{}",
            token_id,
            multiplier,
            note.map(|n| format!(" ({})", n)).unwrap_or_default()
        );
        Ok(())
    }

    /// Storage-wide sweep clearing every time-boxed boost whose expiry has
    /// passed. Idempotent; safe on any cadence. Returns the number of
    /// boosts cleared.
    pub fn expire_stale_boosts(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut cleared = 0;
        for token_id in self.store.token_ids() {
            let expired = self.store.with_token(token_id, |store| {
                store.mutate_token(token_id, |t| {
                    match &t.boost {
                        Some(b) if b.expires_at <= now => {
                            t.boost = None;
                            Ok(true)
                        }
                        _ => Ok(false),
                    }
                })
            })?;
            if expired {
                cleared += 1;
            }
        }
        if cleared > 0 {
            tracing::info!("expired {} stale boosts", cleared);
        }
        Ok(cleared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use markt_core::Token;

    fn setup() -> (Arc<MarketStore>, BoostManager) {
        let store = Arc::new(MarketStore::new());
        for id in 1..=3u64 {
            store
                .add_token(
                    Token::new(id, format!("T{}", id), 0.15, 0.00015, true, None, Utc::now())
                        .unwrap(),
                )
                .unwrap();
        }
        let boosts = BoostManager::new(store.clone());
        (store, boosts)
    }

    #[test]
    fn test_boost_scales_quoted_price() {
        let (_, boosts) = setup();
        let now = Utc::now();
        boosts.set_time_boxed_boost(1, 1.5, 1, None, now).unwrap();
        let quoted = boosts.effective_price(1, now).unwrap();
        assert!((quoted - 0.15 * 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_set_boost_validation() {
        let (_, boosts) = setup();
        let now = Utc::now();
        assert!(boosts.set_time_boxed_boost(1, 0.0, 1, None, now).is_err());
        assert!(boosts.set_time_boxed_boost(1, 1.5, 0, None, now).is_err());
        assert!(boosts.set_seasonal_multiplier(1, -0.1, None).is_err());
        assert!(boosts.set_seasonal_multiplier(1, 0.0, None).is_ok());
    }

    #[test]
    fn test_expiry_sweep_is_idempotent() {
        let (store, boosts) = setup();
        let now = Utc::now();
        boosts.set_time_boxed_boost(1, 1.5, 1, None, now).unwrap();
        boosts.set_time_boxed_boost(2, 2.0, 48, None, now).unwrap();

        let later = now + Duration::hours(2);
        assert_eq!(boosts.expire_stale_boosts(later).unwrap(), 1);
        assert_eq!(boosts.expire_stale_boosts(later).unwrap(), 0);

        assert!(store.get_token(1).unwrap().boost.is_none());
        assert!(store.get_token(2).unwrap().boost.is_some());

        // quoted price reverted once the boost was swept
        let quoted = boosts.effective_price(1, later).unwrap();
        assert!((quoted - 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_clear_boost() {
        let (store, boosts) = setup();
        let now = Utc::now();
        boosts.set_time_boxed_boost(3, 1.2, 5, Some("promo".into()), now).unwrap();
        boosts.clear_time_boxed_boost(3).unwrap();
        assert!(store.get_token(3).unwrap().boost.is_none());
    }
}
