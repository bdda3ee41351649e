//! Admin token management

use chrono::{DateTime, Utc};
use markt_core::{MarketError, Month, Result, Token};
use markt_storage::MarketStore;
use std::sync::Arc;

pub struct TokenAdmin {
    store: Arc<MarketStore>,
}

impl TokenAdmin {
    pub fn new(store: Arc<MarketStore>) -> Self {
        TokenAdmin { store }
    }

    /// Register a new token with a validated curve and a unique ticker
    #[allow(clippy::too_many_arguments)]
    pub fn create_token(
        &self,
        id: u64,
        ticker: &str,
        p0: f64,
        k: f64,
        is_permanent: bool,
        season: Option<Month>,
        now: DateTime<Utc>,
    ) -> Result<Token> {
        if ticker.trim().is_empty() {
            return Err(MarketError::Validation("ticker must not be empty".into()));
        }
        let token = Token::new(id, ticker.trim().to_uppercase(), p0, k, is_permanent, season, now)?;
        self.store.add_token(token.clone())?;
        tracing::info!("created token {} ({})", token.id, token.ticker);
        Ok(token)
    }

    pub fn set_token_active(&self, token_id: u64, active: bool) -> Result<()> {
        self.store.with_token(token_id, |store| {
            store.mutate_token(token_id, |t| {
                t.is_active = active;
                Ok(())
            })
        })
    }

    /// Explicit admin edit of the curve parameters. The next trade prices
    /// against the new curve at the current supply.
    pub fn update_curve(&self, token_id: u64, p0: f64, k: f64) -> Result<()> {
        if p0 <= 0.0 || !p0.is_finite() || k <= 0.0 || !k.is_finite() {
            return Err(MarketError::Validation(format!(
                "curve parameters must be positive, got p0={} k={}",
                p0, k
            )));
        }
        self.store.with_token(token_id, |store| {
            store.mutate_token(token_id, |t| {
                t.p0 = p0;
                t.k = k;
                Ok(())
            })
        })?;
        tracing::warn!("curve of token {} changed to p0={} k={}", token_id, p0, k);
        Ok(())
    }
}
