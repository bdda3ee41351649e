//! Month-end orchestration
//!
//! Five ordered phases close month M into M+1. The snapshot runs first
//! because liquidation mutates the balances it must capture. A checkpoint
//! is persisted after every phase, so a crashed run resumes where it
//! stopped; snapshot and achievements are additionally write-once per
//! month, and liquidation converges to a no-op over emptied positions, so
//! a full re-run is safe end-to-end.

use chrono::{DateTime, Utc};
use markt_core::{
    LifecycleCheckpoint, LifecyclePhase, MarketConfig, MarketError, Month, MonthlyRankingEntry,
    Result,
};
use markt_economics::effective_price;
use markt_exchange::TransactionProcessor;
use markt_storage::MarketStore;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::achievements::AchievementCalculator;

/// Per-phase counts of one orchestrator run
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LifecycleReport {
    pub month: Option<Month>,
    pub snapshot_entries: usize,
    pub achievements_awarded: usize,
    pub positions_liquidated: usize,
    pub balances_reset: usize,
    pub tokens_rolled: usize,
    /// Phase the run resumed after, when a checkpoint was found
    pub resumed_after: Option<LifecyclePhase>,
}

pub struct MonthlyOrchestrator {
    store: Arc<MarketStore>,
    processor: TransactionProcessor,
    achievements: AchievementCalculator,
    config: MarketConfig,
    /// The batch must never run concurrently with itself
    run_guard: Mutex<()>,
}

impl MonthlyOrchestrator {
    pub fn new(store: Arc<MarketStore>, config: MarketConfig) -> Self {
        let processor = TransactionProcessor::new(store.clone(), config.clone());
        let achievements = AchievementCalculator::new(store.clone());
        MonthlyOrchestrator {
            store,
            processor,
            achievements,
            config,
            run_guard: Mutex::new(()),
        }
    }

    /// Run the full five-phase close of `month`. Resumes after the last
    /// checkpointed phase when a previous run for the same month stopped
    /// partway.
    pub fn run_monthly_lifecycle(&self, month: Month, now: DateTime<Utc>) -> Result<LifecycleReport> {
        let _guard = self.run_guard.try_lock().ok_or_else(|| {
            MarketError::Lifecycle("monthly lifecycle already running".to_string())
        })?;

        let resumed_after = self
            .store
            .checkpoint()
            .filter(|c| c.month == month)
            .map(|c| c.completed);
        if resumed_after == Some(LifecyclePhase::TokenRollover) {
            return Err(MarketError::Lifecycle(format!(
                "month {} already closed",
                month
            )));
        }

        let mut report = LifecycleReport {
            month: Some(month),
            resumed_after,
            ..Default::default()
        };

        for phase in LifecyclePhase::ALL {
            if resumed_after.map_or(false, |done| phase <= done) {
                tracing::info!("skipping phase {} of {} (checkpointed)", phase, month);
                continue;
            }
            self.run_phase(phase, month, now, &mut report)?;
            self.store.set_checkpoint(LifecycleCheckpoint {
                month,
                completed: phase,
                recorded_at: Utc::now(),
            });
        }

        tracing::info!(
            "closed month {}: {} ranked, {} awards, {} liquidated, {} reset, {} rolled",
            month,
            report.snapshot_entries,
            report.achievements_awarded,
            report.positions_liquidated,
            report.balances_reset,
            report.tokens_rolled
        );
        Ok(report)
    }

    /// Phases 1-2 only: recompute nothing if the month is already
    /// snapshotted, never touch balances or positions. Safe to trigger
    /// manually on any cadence.
    pub fn run_snapshot_only(&self, month: Month, now: DateTime<Utc>) -> Result<LifecycleReport> {
        let _guard = self.run_guard.try_lock().ok_or_else(|| {
            MarketError::Lifecycle("monthly lifecycle already running".to_string())
        })?;
        let mut report = LifecycleReport {
            month: Some(month),
            ..Default::default()
        };
        self.run_phase(LifecyclePhase::Snapshot, month, now, &mut report)?;
        self.run_phase(LifecyclePhase::Achievements, month, now, &mut report)?;
        Ok(report)
    }

    fn run_phase(
        &self,
        phase: LifecyclePhase,
        month: Month,
        now: DateTime<Utc>,
        report: &mut LifecycleReport,
    ) -> Result<()> {
        tracing::info!("phase {} for {}", phase, month);
        match phase {
            LifecyclePhase::Snapshot => report.snapshot_entries = self.snapshot_rankings(month, now)?,
            LifecyclePhase::Achievements => {
                report.achievements_awarded = self.award_achievements(month)?
            }
            LifecyclePhase::Liquidation => {
                report.positions_liquidated = self.liquidate_positions(now)?
            }
            LifecyclePhase::BalanceReset => report.balances_reset = self.reset_balances()?,
            LifecyclePhase::TokenRollover => report.tokens_rolled = self.rollover_tokens(month)?,
        }
        Ok(())
    }

    /// Phase 1: rank every non-admin user by total value and persist the
    /// top of the board. Write-once per month.
    fn snapshot_rankings(&self, month: Month, now: DateTime<Utc>) -> Result<usize> {
        let existing = self.store.rankings_for_month(month);
        if !existing.is_empty() {
            tracing::info!("rankings for {} already written, keeping them", month);
            return Ok(existing.len());
        }

        let tokens: std::collections::HashMap<u64, _> =
            self.store.tokens().into_iter().map(|t| (t.id, t)).collect();
        let starting = self.config.starting_balance_eur;

        let mut rows: Vec<MonthlyRankingEntry> = Vec::new();
        for user in self.store.users() {
            if user.is_admin() {
                continue;
            }
            let mut spot_value = 0.0;
            let mut invested_value = 0.0;
            for position in self.store.positions_for_user(user.id) {
                let Some(token) = tokens.get(&position.token_id) else {
                    continue;
                };
                spot_value += position.fractions * effective_price(token, now)?;
                invested_value += position.fractions * position.average_buy_price;
            }
            let total_value = user.balance_eur + spot_value;
            rows.push(MonthlyRankingEntry {
                month,
                position: 0, // assigned after sorting
                user_id: user.id,
                balance_eur: user.balance_eur,
                invested_value,
                spot_value,
                total_value,
                gain_percent: (total_value - starting) / starting * 100.0,
                computed_at: Utc::now(),
            });
        }

        // descending by total value; ties go to the first-computed row,
        // then to the lower user id
        rows.sort_by(|a, b| {
            b.total_value
                .partial_cmp(&a.total_value)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.computed_at.cmp(&b.computed_at))
                .then(a.user_id.cmp(&b.user_id))
        });
        rows.truncate(self.config.leaderboard_size);
        for (i, row) in rows.iter_mut().enumerate() {
            row.position = (i + 1) as u32;
        }

        for row in &rows {
            self.store
                .mutate_user(row.user_id, |u| {
                    u.record_rank(row.position, month);
                    Ok(())
                })?;
        }
        let count = rows.len();
        self.store.append_rankings(rows);
        Ok(count)
    }

    /// Phase 2: persist the month's awards and bump the winners' lifetime
    /// counters. Write-once per month.
    fn award_achievements(&self, month: Month) -> Result<usize> {
        let existing = self.store.achievements_for_month(month);
        if !existing.is_empty() {
            tracing::info!("achievements for {} already written, keeping them", month);
            return Ok(existing.len());
        }

        let awards = self.achievements.compute(month)?;
        for award in &awards {
            self.store.mutate_user(award.user_id, |u| {
                u.achievement_count += 1;
                Ok(())
            })?;
        }
        let count = awards.len();
        self.store.append_achievements(awards);
        Ok(count)
    }

    /// Phase 3: force-sell every open non-admin position at the standard
    /// sell path. Already-emptied positions are skipped, so a second pass
    /// is a no-op.
    fn liquidate_positions(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut liquidated = 0;
        for position in self.store.positions() {
            let is_admin = self.store.get_user(position.user_id)?.is_admin();
            if is_admin {
                continue;
            }
            if self
                .processor
                .liquidate_position(position.token_id, position.user_id, now)?
                .is_some()
            {
                liquidated += 1;
            }
        }
        Ok(liquidated)
    }

    /// Phase 4: every non-admin balance back to the fixed starting value.
    /// Liquidation proceeds are discarded; each month is a fresh round.
    fn reset_balances(&self) -> Result<usize> {
        let starting = self.config.starting_balance_eur;
        let mut reset = 0;
        for user in self.store.users() {
            if user.is_admin() {
                continue;
            }
            self.store.mutate_user(user.id, |u| {
                u.balance_eur = starting;
                Ok(())
            })?;
            reset += 1;
        }
        Ok(reset)
    }

    /// Phase 5: retire temporary tokens whose season ended, restart the
    /// curve of active permanent tokens, clear every boost platform-wide.
    fn rollover_tokens(&self, month: Month) -> Result<usize> {
        let new_month = month.next();
        let mut rolled = 0;
        for token_id in self.store.token_ids() {
            let touched = self.store.with_token(token_id, |store| {
                store.mutate_token(token_id, |t| {
                    let mut touched = false;
                    if !t.is_permanent && t.is_active && t.season != Some(new_month) {
                        t.is_active = false;
                        touched = true;
                    }
                    if t.is_permanent && t.is_active && t.supply != 0.0 {
                        t.supply = 0.0;
                        touched = true;
                    }
                    if t.boost.is_some() {
                        t.boost = None;
                        touched = true;
                    }
                    if t.seasonal_multiplier != 1.0 {
                        t.seasonal_multiplier = 1.0;
                        touched = true;
                    }
                    Ok(touched)
                })
            })?;
            if touched {
                rolled += 1;
            }
        }
        Ok(rolled)
    }
}
