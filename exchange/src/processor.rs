//! Trade settlement
//!
//! A trade runs validate -> price -> settle -> record, synchronously and
//! inside the token's critical section. The buyer's price is locked in at
//! the pre-mint supply; the admin skim is minted on top, so it dilutes the
//! next trade, not the current one.

use crate::buffer::AdminBufferManager;
use chrono::{DateTime, Utc};
use markt_core::{MarketConfig, MarketError, Result, TransactionKind};
use markt_economics::{effective_price, BondingCurve};
use markt_storage::MarketStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyReceipt {
    pub transaction_id: u64,
    pub user_fractions: f64,
    pub admin_fractions: f64,
    pub price_before: f64,
    pub price_after: f64,
    pub supply_before: f64,
    pub supply_after: f64,
    pub new_balance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellReceipt {
    pub transaction_id: u64,
    pub gross_eur: f64,
    pub spread_eur: f64,
    pub net_eur: f64,
    pub price_before: f64,
    pub price_after: f64,
    pub supply_before: f64,
    pub supply_after: f64,
    pub new_balance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantReceipt {
    pub fractions: f64,
    pub reference_price: f64,
    pub supply_after: f64,
}

pub struct TransactionProcessor {
    store: Arc<MarketStore>,
    buffers: AdminBufferManager,
    config: MarketConfig,
}

impl TransactionProcessor {
    pub fn new(store: Arc<MarketStore>, config: MarketConfig) -> Self {
        let buffers = AdminBufferManager::new(store.clone());
        TransactionProcessor {
            store,
            buffers,
            config,
        }
    }

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    /// Spend `amount_eur` of the buyer's balance on the token. Fractions
    /// are sized from the pre-mint supply; the skim is minted on top and
    /// routed into the token's admin buffer.
    pub fn buy(
        &self,
        token_id: u64,
        user_id: u64,
        amount_eur: f64,
        now: DateTime<Utc>,
    ) -> Result<BuyReceipt> {
        if amount_eur <= 0.0 || !amount_eur.is_finite() {
            return Err(MarketError::Validation(format!(
                "buy amount must be positive, got {}",
                amount_eur
            )));
        }

        self.store.with_token(token_id, |store| {
            let token = store.get_token(token_id)?;
            if !token.is_active {
                return Err(MarketError::InactiveToken(token_id));
            }

            let supply_before = token.supply;
            let price_before = effective_price(&token, now)?;

            let user_fractions =
                BondingCurve::fractions_for_currency(amount_eur, token.p0, token.k, supply_before)?;
            let admin_fractions = user_fractions * self.config.admin_skim_rate;

            // deduct-if-sufficient as one read-modify-write: the token lock
            // does not cover the user row, and the same user may be settling
            // a buy on another token concurrently
            let new_balance = store.mutate_user(user_id, |u| {
                if u.balance_eur < amount_eur {
                    return Err(MarketError::InsufficientFunds {
                        requested: amount_eur,
                        available: u.balance_eur,
                    });
                }
                u.balance_eur -= amount_eur;
                Ok(u.balance_eur)
            })?;

            store.mutate_token(token_id, |t| t.mint(user_fractions + admin_fractions))?;
            store.mutate_position(user_id, token_id, |p| {
                p.apply_buy(user_fractions, amount_eur);
                Ok(())
            })?;
            self.buffers.accrue(token_id, admin_fractions)?;

            let token_after = store.get_token(token_id)?;
            let price_after = effective_price(&token_after, now)?;

            let record = store.append_transaction(
                TransactionKind::Buy,
                token_id,
                user_id,
                user_fractions,
                amount_eur / user_fractions,
                amount_eur,
                now,
                false,
            );

            tracing::info!(
                "buy: user {} spent {:.2} EUR on token {} for {:.4} fractions (skim {:.4})",
                user_id,
                amount_eur,
                token_id,
                user_fractions,
                admin_fractions
            );

            Ok(BuyReceipt {
                transaction_id: record.id,
                user_fractions,
                admin_fractions,
                price_before,
                price_after,
                supply_before,
                supply_after: token_after.supply,
                new_balance,
            })
        })
    }

    /// Sell `fractions` of the caller's position. Proceeds are the curve
    /// integral at current supply minus the fixed spread.
    pub fn sell(
        &self,
        token_id: u64,
        user_id: u64,
        fractions: f64,
        now: DateTime<Utc>,
    ) -> Result<SellReceipt> {
        if fractions <= 0.0 || !fractions.is_finite() {
            return Err(MarketError::Validation(format!(
                "sell fractions must be positive, got {}",
                fractions
            )));
        }

        self.store.with_token(token_id, |store| {
            let token = store.get_token(token_id)?;
            if !token.is_active {
                return Err(MarketError::InactiveToken(token_id));
            }
            let held = store
                .get_position(user_id, token_id)
                .map(|p| p.fractions)
                .unwrap_or(0.0);
            if fractions > held {
                return Err(MarketError::InsufficientPosition {
                    requested: fractions,
                    held,
                });
            }

            self.settle_sell(store, token_id, user_id, fractions, now, false)
        })
    }

    /// Force-sell a user's entire position, tagged as a liquidation.
    /// Skips the caller-initiated validation (the batch sells whatever is
    /// held, active or not) but settles exactly like a market sell.
    pub fn liquidate_position(
        &self,
        token_id: u64,
        user_id: u64,
        now: DateTime<Utc>,
    ) -> Result<Option<SellReceipt>> {
        self.store.with_token(token_id, |store| {
            let held = store
                .get_position(user_id, token_id)
                .map(|p| p.fractions)
                .unwrap_or(0.0);
            if held <= 0.0 {
                // already emptied; re-running the batch is a no-op here
                return Ok(None);
            }
            let receipt = self.settle_sell(store, token_id, user_id, held, now, true)?;
            Ok(Some(receipt))
        })
    }

    /// Shared sell settlement. Callers have validated and hold the token's
    /// critical section.
    fn settle_sell(
        &self,
        store: &MarketStore,
        token_id: u64,
        user_id: u64,
        fractions: f64,
        now: DateTime<Utc>,
        is_liquidation: bool,
    ) -> Result<SellReceipt> {
        let token = store.get_token(token_id)?;
        let supply_before = token.supply;
        let price_before = effective_price(&token, now)?;

        let gross_eur =
            BondingCurve::currency_for_fractions(fractions, token.p0, token.k, supply_before)?;
        let spread_eur = gross_eur * self.config.sell_spread;
        let net_eur = gross_eur - spread_eur;

        store.mutate_token(token_id, |t| t.burn(fractions))?;
        store.mutate_position(user_id, token_id, |p| p.apply_sell(fractions))?;
        let new_balance = store.mutate_user(user_id, |u| {
            u.balance_eur += net_eur;
            Ok(u.balance_eur)
        })?;

        let token_after = store.get_token(token_id)?;
        let price_after = effective_price(&token_after, now)?;

        let record = store.append_transaction(
            TransactionKind::Sell,
            token_id,
            user_id,
            fractions,
            gross_eur / fractions,
            net_eur,
            now,
            is_liquidation,
        );

        tracing::info!(
            "sell{}: user {} sold {:.4} fractions of token {} for {:.2} EUR net",
            if is_liquidation { " (liquidation)" } else { "" },
            user_id,
            fractions,
            token_id,
            net_eur
        );

        Ok(SellReceipt {
            transaction_id: record.id,
            gross_eur,
            spread_eur,
            net_eur,
            price_before,
            price_after,
            supply_before,
            supply_after: token_after.supply,
            new_balance,
        })
    }

    /// Free mint granted when a token proposal is approved: a fixed number
    /// of fractions into the creator's position at no cost, no admin skim.
    pub fn grant_creator_reward(
        &self,
        token_id: u64,
        user_id: u64,
        now: DateTime<Utc>,
    ) -> Result<GrantReceipt> {
        let fractions = self.config.creator_reward_fractions;
        self.store.with_token(token_id, |store| {
            let token = store.get_token(token_id)?;
            if !token.is_active {
                return Err(MarketError::InactiveToken(token_id));
            }
            store.get_user(user_id)?;

            let reference_price = BondingCurve::price(token.p0, token.k, token.supply)?;
            store.mutate_token(token_id, |t| t.mint(fractions))?;
            store.mutate_position(user_id, token_id, |p| {
                p.apply_grant(fractions, reference_price);
                Ok(())
            })?;

            let supply_after = store.get_token(token_id)?.supply;
            tracing::info!(
                "creator grant: {:.2} fractions of token {} to user {}",
                fractions,
                token_id,
                user_id
            );

            Ok(GrantReceipt {
                fractions,
                reference_price,
                supply_after,
            })
        })
    }
}
