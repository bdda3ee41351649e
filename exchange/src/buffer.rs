//! Admin liquidity buffer
//!
//! Every buy mints a skim on top of the buyer's fractions into a per-token
//! buffer. Consolidation burns the accumulated buffer back into realized
//! currency at the curve price, with no spread (it is an internal
//! operation, not a market trade), and credits the platform liquidity
//! account.

use chrono::{DateTime, Utc};
use markt_core::{MarketError, Result};
use markt_economics::{effective_price, BondingCurve};
use markt_storage::MarketStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidationReceipt {
    pub token_id: u64,
    pub fractions_sold: f64,
    pub eur_recovered: f64,
    pub new_price: f64,
}

pub struct AdminBufferManager {
    store: Arc<MarketStore>,
}

impl AdminBufferManager {
    pub fn new(store: Arc<MarketStore>) -> Self {
        AdminBufferManager { store }
    }

    /// Bookkeeping increment for the skim of one buy. The supply mint
    /// already happened in the settle step; callers hold the token's
    /// critical section.
    pub(crate) fn accrue(&self, token_id: u64, fractions: f64) -> Result<()> {
        if fractions < 0.0 || !fractions.is_finite() {
            return Err(MarketError::Validation(format!(
                "skim fractions must be non-negative, got {}",
                fractions
            )));
        }
        self.store.mutate_buffer(token_id, |b| {
            b.fractions += fractions;
            Ok(())
        })
    }

    /// Burn the whole buffer into realized currency. Rejected when the
    /// buffer is empty. Never removes more supply than the buffer held.
    pub fn consolidate(&self, token_id: u64, now: DateTime<Utc>) -> Result<ConsolidationReceipt> {
        self.store.with_token(token_id, |store| {
            let buffer = store.get_buffer(token_id)?;
            if buffer.fractions <= 0.0 {
                return Err(MarketError::EmptyBuffer(token_id));
            }
            let token = store.get_token(token_id)?;
            let fractions = buffer.fractions.min(token.supply);

            let eur_recovered =
                BondingCurve::currency_for_fractions(fractions, token.p0, token.k, token.supply)?;

            store.mutate_token(token_id, |t| t.burn(fractions))?;
            store.mutate_buffer(token_id, |b| {
                b.fractions = 0.0;
                b.consolidated_eur += eur_recovered;
                Ok(())
            })?;
            store.add_liquidity_eur(eur_recovered);

            let token_after = store.get_token(token_id)?;
            let new_price = effective_price(&token_after, now)?;

            tracing::info!(
                "consolidated buffer of token {}: {:.4} fractions -> {:.2} EUR",
                token_id,
                fractions,
                eur_recovered
            );

            Ok(ConsolidationReceipt {
                token_id,
                fractions_sold: fractions,
                eur_recovered,
                new_price,
            })
        })
    }
}
