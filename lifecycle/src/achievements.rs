//! Monthly achievements
//!
//! Four awards derived purely from the transaction ledger of one calendar
//! month. Each is independently optional: no qualifying activity, no award.
//! Ties break by earliest qualifying timestamp where one exists, then by
//! lower user id, so results never depend on storage order.

use chrono::{DateTime, Duration, Utc};
use markt_core::{
    constants, AchievementKind, Month, MonthlyAchievement, Result, Token, TransactionKind,
    TransactionRecord,
};
use markt_storage::MarketStore;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub struct AchievementCalculator {
    store: Arc<MarketStore>,
}

impl AchievementCalculator {
    pub fn new(store: Arc<MarketStore>) -> Self {
        AchievementCalculator { store }
    }

    /// Compute all awards for the month. Read-only.
    pub fn compute(&self, month: Month) -> Result<Vec<MonthlyAchievement>> {
        let txs = self.store.transactions_in_month(month);
        let tokens: HashMap<u64, Token> =
            self.store.tokens().into_iter().map(|t| (t.id, t)).collect();

        let mut awards = Vec::new();
        if let Some(a) = early_bird(month, &txs, &tokens) {
            awards.push(a);
        }
        if let Some(a) = trader(month, &txs) {
            awards.push(a);
        }
        if let Some(a) = sniper(month, &txs, &tokens) {
            awards.push(a);
        }
        if let Some(a) = hodler(month, &txs) {
            awards.push(a);
        }
        Ok(awards)
    }
}

/// Most buys within 24 hours of the bought token's creation
fn early_bird(
    month: Month,
    txs: &[TransactionRecord],
    tokens: &HashMap<u64, Token>,
) -> Option<MonthlyAchievement> {
    let window = Duration::hours(constants::EARLY_BIRD_WINDOW_HOURS);
    let mut per_user: HashMap<u64, (u32, DateTime<Utc>)> = HashMap::new();
    for tx in txs {
        if tx.kind != TransactionKind::Buy {
            continue;
        }
        let Some(token) = tokens.get(&tx.token_id) else {
            continue;
        };
        if tx.executed_at >= token.created_at && tx.executed_at - token.created_at <= window {
            let entry = per_user.entry(tx.user_id).or_insert((0, tx.executed_at));
            entry.0 += 1;
            if tx.executed_at < entry.1 {
                entry.1 = tx.executed_at;
            }
        }
    }

    // max count; ties by earliest qualifying buy, then lower user id
    let (user_id, (count, _)) = per_user.into_iter().min_by(|a, b| {
        b.1 .0
            .cmp(&a.1 .0)
            .then(a.1 .1.cmp(&b.1 .1))
            .then(a.0.cmp(&b.0))
    })?;

    Some(MonthlyAchievement {
        month,
        kind: AchievementKind::EarlyBird,
        user_id,
        metric: count as f64,
        description: format!("{} buys within 24h of token launch", count),
    })
}

/// Most transactions overall (buys plus sells)
fn trader(month: Month, txs: &[TransactionRecord]) -> Option<MonthlyAchievement> {
    let mut per_user: HashMap<u64, u32> = HashMap::new();
    for tx in txs {
        *per_user.entry(tx.user_id).or_default() += 1;
    }
    let (user_id, count) = per_user
        .into_iter()
        .min_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)))?;

    Some(MonthlyAchievement {
        month,
        kind: AchievementKind::Trader,
        user_id,
        metric: count as f64,
        description: format!("{} trades this month", count),
    })
}

/// Most sells executed at >= 95% of the sold token's monthly peak price
fn sniper(
    month: Month,
    txs: &[TransactionRecord],
    tokens: &HashMap<u64, Token>,
) -> Option<MonthlyAchievement> {
    let mut peak_by_token: HashMap<u64, f64> = HashMap::new();
    for tx in txs {
        let active = tokens.get(&tx.token_id).map(|t| t.is_active).unwrap_or(false);
        if !active {
            continue;
        }
        let peak = peak_by_token.entry(tx.token_id).or_insert(0.0);
        if tx.price_per_fraction > *peak {
            *peak = tx.price_per_fraction;
        }
    }

    let mut per_user: HashMap<u64, u32> = HashMap::new();
    for tx in txs {
        if tx.kind != TransactionKind::Sell {
            continue;
        }
        let Some(peak) = peak_by_token.get(&tx.token_id) else {
            continue;
        };
        if tx.price_per_fraction >= constants::SNIPER_PEAK_RATIO * peak {
            *per_user.entry(tx.user_id).or_default() += 1;
        }
    }

    let (user_id, count) = per_user
        .into_iter()
        .min_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)))?;

    Some(MonthlyAchievement {
        month,
        kind: AchievementKind::Sniper,
        user_id,
        metric: count as f64,
        description: format!("{} sells near the monthly peak", count),
    })
}

/// Most distinct tokens with at least one buy and no sell in the month
fn hodler(month: Month, txs: &[TransactionRecord]) -> Option<MonthlyAchievement> {
    let mut bought: HashMap<u64, HashSet<u64>> = HashMap::new();
    let mut sold: HashMap<u64, HashSet<u64>> = HashMap::new();
    for tx in txs {
        match tx.kind {
            TransactionKind::Buy => bought.entry(tx.user_id).or_default().insert(tx.token_id),
            TransactionKind::Sell => sold.entry(tx.user_id).or_default().insert(tx.token_id),
        };
    }

    let mut per_user: HashMap<u64, u32> = HashMap::new();
    for (user_id, tokens_bought) in &bought {
        let tokens_sold = sold.get(user_id);
        let held = tokens_bought
            .iter()
            .filter(|t| tokens_sold.map_or(true, |s| !s.contains(t)))
            .count() as u32;
        if held > 0 {
            per_user.insert(*user_id, held);
        }
    }

    let (user_id, count) = per_user
        .into_iter()
        .min_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)))?;

    Some(MonthlyAchievement {
        month,
        kind: AchievementKind::Hodler,
        user_id,
        metric: count as f64,
        description: format!("{} tokens bought and held all month", count),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use markt_core::{Role, User};
    use markt_storage::MarketStore;

    const MONTH: Month = Month {
        year: 2026,
        month: 3,
    };

    fn setup() -> (Arc<MarketStore>, AchievementCalculator) {
        let store = Arc::new(MarketStore::new());
        let t0 = MONTH.start();
        store
            .add_token(Token::new(1, "AAA", 0.15, 0.00015, true, None, t0).unwrap())
            .unwrap();
        store
            .add_token(Token::new(2, "BBB", 0.15, 0.00015, true, None, t0).unwrap())
            .unwrap();
        for id in [10, 11] {
            store
                .add_user(User::new(id, format!("u{}", id), 150.0, Role::User))
                .unwrap();
        }
        let calc = AchievementCalculator::new(store.clone());
        (store, calc)
    }

    fn record(
        store: &MarketStore,
        kind: TransactionKind,
        token: u64,
        user: u64,
        price: f64,
        hours_in: i64,
    ) {
        store.append_transaction(
            kind,
            token,
            user,
            1.0,
            price,
            price,
            MONTH.start() + Duration::hours(hours_in),
            false,
        );
    }

    #[test]
    fn test_no_activity_no_awards() {
        let (_, calc) = setup();
        assert!(calc.compute(MONTH).unwrap().is_empty());
    }

    #[test]
    fn test_early_bird_counts_only_window_buys() {
        let (store, calc) = setup();
        // user 10: two buys inside 24h of creation; user 11: one inside, one far out
        record(&store, TransactionKind::Buy, 1, 10, 0.15, 1);
        record(&store, TransactionKind::Buy, 2, 10, 0.15, 2);
        record(&store, TransactionKind::Buy, 1, 11, 0.15, 3);
        record(&store, TransactionKind::Buy, 1, 11, 0.15, 100);

        let awards = calc.compute(MONTH).unwrap();
        let early = awards
            .iter()
            .find(|a| a.kind == AchievementKind::EarlyBird)
            .unwrap();
        assert_eq!(early.user_id, 10);
        assert_eq!(early.metric, 2.0);
    }

    #[test]
    fn test_early_bird_tie_breaks_by_earliest_buy() {
        let (store, calc) = setup();
        record(&store, TransactionKind::Buy, 1, 11, 0.15, 2);
        record(&store, TransactionKind::Buy, 1, 10, 0.15, 5);

        let awards = calc.compute(MONTH).unwrap();
        let early = awards
            .iter()
            .find(|a| a.kind == AchievementKind::EarlyBird)
            .unwrap();
        // both have one qualifying buy; user 11 bought first
        assert_eq!(early.user_id, 11);
    }

    #[test]
    fn test_trader_counts_both_kinds() {
        let (store, calc) = setup();
        record(&store, TransactionKind::Buy, 1, 10, 0.15, 30);
        record(&store, TransactionKind::Sell, 1, 10, 0.16, 31);
        record(&store, TransactionKind::Buy, 1, 11, 0.15, 32);

        let awards = calc.compute(MONTH).unwrap();
        let trader = awards
            .iter()
            .find(|a| a.kind == AchievementKind::Trader)
            .unwrap();
        assert_eq!(trader.user_id, 10);
        assert_eq!(trader.metric, 2.0);
    }

    #[test]
    fn test_sniper_requires_near_peak_sells() {
        let (store, calc) = setup();
        // peak price on token 1 is 0.20
        record(&store, TransactionKind::Buy, 1, 11, 0.20, 40);
        // user 10 sells at 96% of peak (qualifies) and at 80% (does not)
        record(&store, TransactionKind::Sell, 1, 10, 0.192, 41);
        record(&store, TransactionKind::Sell, 1, 10, 0.16, 42);
        // user 11 sells below threshold
        record(&store, TransactionKind::Sell, 1, 11, 0.18, 43);

        let awards = calc.compute(MONTH).unwrap();
        let sniper = awards
            .iter()
            .find(|a| a.kind == AchievementKind::Sniper)
            .unwrap();
        assert_eq!(sniper.user_id, 10);
        assert_eq!(sniper.metric, 1.0);
    }

    #[test]
    fn test_hodler_counts_unsold_tokens() {
        let (store, calc) = setup();
        // user 10 buys both tokens, sells neither
        record(&store, TransactionKind::Buy, 1, 10, 0.15, 50);
        record(&store, TransactionKind::Buy, 2, 10, 0.15, 51);
        // user 11 buys both but sells one
        record(&store, TransactionKind::Buy, 1, 11, 0.15, 52);
        record(&store, TransactionKind::Buy, 2, 11, 0.15, 53);
        record(&store, TransactionKind::Sell, 2, 11, 0.15, 54);

        let awards = calc.compute(MONTH).unwrap();
        let hodler = awards
            .iter()
            .find(|a| a.kind == AchievementKind::Hodler)
            .unwrap();
        assert_eq!(hodler.user_id, 10);
        assert_eq!(hodler.metric, 2.0);
    }

    #[test]
    fn test_other_months_ignored() {
        let (store, calc) = setup();
        store.append_transaction(
            TransactionKind::Buy,
            1,
            10,
            1.0,
            0.15,
            0.15,
            MONTH.next().start() + Duration::hours(1),
            false,
        );
        assert!(calc.compute(MONTH).unwrap().is_empty());
    }
}
