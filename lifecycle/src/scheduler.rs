//! Background jobs
//!
//! Two loops: an hourly tick that decides whether the previous month still
//! needs closing, and the boost expiry sweep. Both report outcomes through
//! the notifier; neither retries automatically — a failed close is retried
//! on the next tick, a failed sweep on the next cadence.

use chrono::{DateTime, Utc};
use markt_core::{LifecycleCheckpoint, LifecyclePhase, MarketConfig, Month};
use markt_exchange::BoostManager;
use markt_storage::MarketStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::notifier::JobNotifier;
use crate::orchestrator::MonthlyOrchestrator;

const MONTHLY_TICK_SECS: u64 = 3600;

pub struct Scheduler {
    store: Arc<MarketStore>,
    boosts: Arc<BoostManager>,
    orchestrator: Arc<MonthlyOrchestrator>,
    notifier: Arc<dyn JobNotifier>,
    config: MarketConfig,
}

impl Scheduler {
    pub fn new(
        store: Arc<MarketStore>,
        orchestrator: Arc<MonthlyOrchestrator>,
        notifier: Arc<dyn JobNotifier>,
        config: MarketConfig,
    ) -> Self {
        let boosts = Arc::new(BoostManager::new(store.clone()));
        Scheduler {
            store,
            boosts,
            orchestrator,
            notifier,
            config,
        }
    }

    /// Spawn the hourly boost expiry sweep
    pub fn spawn_boost_sweep(&self) -> JoinHandle<()> {
        let boosts = self.boosts.clone();
        let notifier = self.notifier.clone();
        let period = Duration::from_secs(self.config.boost_sweep_interval_secs);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                match boosts.expire_stale_boosts(Utc::now()) {
                    Ok(cleared) if cleared > 0 => {
                        notifier.job_succeeded("boost-sweep", &format!("{} cleared", cleared))
                    }
                    Ok(_) => {}
                    Err(e) => notifier.job_failed("boost-sweep", &e),
                }
            }
        })
    }

    /// Spawn the monthly close loop. Every tick it checks whether the
    /// previous calendar month is fully closed and runs the orchestrator
    /// if not, so a failed or crashed close is picked up again.
    pub fn spawn_monthly_close(&self) -> JoinHandle<()> {
        let store = self.store.clone();
        let orchestrator = self.orchestrator.clone();
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(MONTHLY_TICK_SECS));
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let now = Utc::now();
                let Some(month) = month_to_close(now, store.checkpoint()) else {
                    continue;
                };
                tracing::info!("closing month {}", month);
                match orchestrator.run_monthly_lifecycle(month, now) {
                    Ok(report) => notifier.job_succeeded(
                        "monthly-lifecycle",
                        &format!(
                            "month {}: {} ranked, {} liquidated",
                            month, report.snapshot_entries, report.positions_liquidated
                        ),
                    ),
                    Err(e) => notifier.job_failed("monthly-lifecycle", &e),
                }
            }
        })
    }
}

/// The previous calendar month, unless the checkpoint shows it fully
/// closed already.
pub fn month_to_close(now: DateTime<Utc>, checkpoint: Option<LifecycleCheckpoint>) -> Option<Month> {
    let target = Month::containing(now).prev();
    match checkpoint {
        Some(c) if c.month > target => None,
        Some(c) if c.month == target && c.completed == LifecyclePhase::TokenRollover => None,
        _ => Some(target),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    fn checkpoint(month: Month, completed: LifecyclePhase) -> LifecycleCheckpoint {
        LifecycleCheckpoint {
            month,
            completed,
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn test_no_checkpoint_closes_previous_month() {
        let m = month_to_close(at(2026, 3, 1), None);
        assert_eq!(m, Some(Month::new(2026, 2)));
    }

    #[test]
    fn test_fully_closed_month_is_skipped() {
        let c = checkpoint(Month::new(2026, 2), LifecyclePhase::TokenRollover);
        assert_eq!(month_to_close(at(2026, 3, 1), Some(c)), None);
    }

    #[test]
    fn test_partial_close_is_resumed() {
        let c = checkpoint(Month::new(2026, 2), LifecyclePhase::Liquidation);
        assert_eq!(
            month_to_close(at(2026, 3, 1), Some(c)),
            Some(Month::new(2026, 2))
        );
    }

    #[test]
    fn test_stale_checkpoint_still_closes() {
        let c = checkpoint(Month::new(2026, 1), LifecyclePhase::TokenRollover);
        assert_eq!(
            month_to_close(at(2026, 3, 1), Some(c)),
            Some(Month::new(2026, 2))
        );
    }
}
