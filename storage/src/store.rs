//! In-memory market store with per-key locking

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use markt_core::{
    AdminBuffer, LifecycleCheckpoint, MarketError, Month, MonthlyAchievement,
    MonthlyRankingEntry, Position, Result, Token, TransactionKind, TransactionRecord, User,
};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Store for all market entities. Tokens, users and positions live in
/// per-key maps; the ledger and the monthly tables are append-only.
pub struct MarketStore {
    tokens: DashMap<u64, Token>,
    buffers: DashMap<u64, AdminBuffer>,
    users: DashMap<u64, User>,
    /// Keyed by (user id, token id)
    positions: DashMap<(u64, u64), Position>,
    ledger: RwLock<Vec<TransactionRecord>>,
    rankings: RwLock<Vec<MonthlyRankingEntry>>,
    achievements: RwLock<Vec<MonthlyAchievement>>,
    checkpoint: Mutex<Option<LifecycleCheckpoint>>,
    /// Platform liquidity account fed by buffer consolidations
    liquidity_eur: Mutex<f64>,
    next_tx_id: AtomicU64,
    /// One mutex per token id, serializing supply-touching operations
    token_locks: DashMap<u64, Arc<Mutex<()>>>,
}

impl MarketStore {
    pub fn new() -> Self {
        MarketStore {
            tokens: DashMap::new(),
            buffers: DashMap::new(),
            users: DashMap::new(),
            positions: DashMap::new(),
            ledger: RwLock::new(Vec::new()),
            rankings: RwLock::new(Vec::new()),
            achievements: RwLock::new(Vec::new()),
            checkpoint: Mutex::new(None),
            liquidity_eur: Mutex::new(0.0),
            next_tx_id: AtomicU64::new(1),
            token_locks: DashMap::new(),
        }
    }

    /// Run `f` inside the token's critical section. Every buy, sell, skim,
    /// consolidation, grant and liquidation against a token goes through
    /// here, so two settle operations on the same token never interleave
    /// their read-modify-write. Do not nest calls for different tokens.
    pub fn with_token<R>(&self, token_id: u64, f: impl FnOnce(&Self) -> Result<R>) -> Result<R> {
        let lock = self
            .token_locks
            .entry(token_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock();
        f(self)
    }

    // --- tokens ---

    pub fn add_token(&self, token: Token) -> Result<()> {
        if self.tokens.contains_key(&token.id) {
            return Err(MarketError::Validation(format!(
                "token id {} already exists",
                token.id
            )));
        }
        if self
            .tokens
            .iter()
            .any(|t| t.ticker.eq_ignore_ascii_case(&token.ticker))
        {
            return Err(MarketError::DuplicateTicker(token.ticker));
        }
        self.buffers.insert(token.id, AdminBuffer::new(token.id));
        self.tokens.insert(token.id, token);
        Ok(())
    }

    pub fn get_token(&self, id: u64) -> Result<Token> {
        self.tokens
            .get(&id)
            .map(|t| t.clone())
            .ok_or(MarketError::TokenNotFound(id))
    }

    pub fn mutate_token<R>(&self, id: u64, f: impl FnOnce(&mut Token) -> Result<R>) -> Result<R> {
        let mut token = self.tokens.get_mut(&id).ok_or(MarketError::TokenNotFound(id))?;
        f(&mut token)
    }

    pub fn tokens(&self) -> Vec<Token> {
        self.tokens.iter().map(|t| t.clone()).collect()
    }

    pub fn token_ids(&self) -> Vec<u64> {
        self.tokens.iter().map(|t| *t.key()).collect()
    }

    // --- admin buffers ---

    pub fn get_buffer(&self, token_id: u64) -> Result<AdminBuffer> {
        self.buffers
            .get(&token_id)
            .map(|b| b.clone())
            .ok_or(MarketError::TokenNotFound(token_id))
    }

    pub fn mutate_buffer<R>(
        &self,
        token_id: u64,
        f: impl FnOnce(&mut AdminBuffer) -> Result<R>,
    ) -> Result<R> {
        let mut buffer = self
            .buffers
            .get_mut(&token_id)
            .ok_or(MarketError::TokenNotFound(token_id))?;
        f(&mut buffer)
    }

    // --- users ---

    pub fn add_user(&self, user: User) -> Result<()> {
        if self.users.contains_key(&user.id) {
            return Err(MarketError::Validation(format!(
                "user id {} already exists",
                user.id
            )));
        }
        self.users.insert(user.id, user);
        Ok(())
    }

    pub fn get_user(&self, id: u64) -> Result<User> {
        self.users
            .get(&id)
            .map(|u| u.clone())
            .ok_or(MarketError::UserNotFound(id))
    }

    pub fn mutate_user<R>(&self, id: u64, f: impl FnOnce(&mut User) -> Result<R>) -> Result<R> {
        let mut user = self.users.get_mut(&id).ok_or(MarketError::UserNotFound(id))?;
        f(&mut user)
    }

    pub fn users(&self) -> Vec<User> {
        self.users.iter().map(|u| u.clone()).collect()
    }

    // --- positions ---

    pub fn get_position(&self, user_id: u64, token_id: u64) -> Option<Position> {
        self.positions.get(&(user_id, token_id)).map(|p| p.clone())
    }

    /// Read-modify-write on a position, creating it when absent. A position
    /// left with zero fractions is removed (closed positions do not linger).
    pub fn mutate_position<R>(
        &self,
        user_id: u64,
        token_id: u64,
        f: impl FnOnce(&mut Position) -> Result<R>,
    ) -> Result<R> {
        let key = (user_id, token_id);
        let mut entry = self
            .positions
            .entry(key)
            .or_insert_with(|| Position::new(user_id, token_id));
        let result = f(&mut entry);
        // cleanup runs even when the closure errors, so a failed mutation
        // on a fresh entry does not leave an empty row behind
        let closed = entry.is_closed();
        drop(entry);
        if closed {
            self.positions.remove(&key);
        }
        result
    }

    pub fn positions(&self) -> Vec<Position> {
        self.positions.iter().map(|p| p.clone()).collect()
    }

    pub fn positions_for_user(&self, user_id: u64) -> Vec<Position> {
        self.positions
            .iter()
            .filter(|p| p.user_id == user_id)
            .map(|p| p.clone())
            .collect()
    }

    // --- transaction ledger (append-only) ---

    #[allow(clippy::too_many_arguments)]
    pub fn append_transaction(
        &self,
        kind: TransactionKind,
        token_id: u64,
        user_id: u64,
        fractions: f64,
        price_per_fraction: f64,
        total_eur: f64,
        executed_at: DateTime<Utc>,
        is_liquidation: bool,
    ) -> TransactionRecord {
        let record = TransactionRecord {
            id: self.next_tx_id.fetch_add(1, Ordering::SeqCst),
            kind,
            token_id,
            user_id,
            fractions,
            price_per_fraction,
            total_eur,
            executed_at,
            is_liquidation,
        };
        self.ledger.write().push(record.clone());
        record
    }

    pub fn transactions_in_month(&self, month: Month) -> Vec<TransactionRecord> {
        self.ledger
            .read()
            .iter()
            .filter(|tx| month.contains(tx.executed_at))
            .cloned()
            .collect()
    }

    pub fn transaction_count(&self) -> usize {
        self.ledger.read().len()
    }

    // --- monthly tables (append-only) ---

    pub fn append_rankings(&self, entries: Vec<MonthlyRankingEntry>) {
        self.rankings.write().extend(entries);
    }

    pub fn rankings_for_month(&self, month: Month) -> Vec<MonthlyRankingEntry> {
        self.rankings
            .read()
            .iter()
            .filter(|e| e.month == month)
            .cloned()
            .collect()
    }

    pub fn append_achievements(&self, entries: Vec<MonthlyAchievement>) {
        self.achievements.write().extend(entries);
    }

    pub fn achievements_for_month(&self, month: Month) -> Vec<MonthlyAchievement> {
        self.achievements
            .read()
            .iter()
            .filter(|a| a.month == month)
            .cloned()
            .collect()
    }

    // --- liquidity account ---

    pub fn add_liquidity_eur(&self, amount: f64) {
        *self.liquidity_eur.lock() += amount;
    }

    pub fn liquidity_eur(&self) -> f64 {
        *self.liquidity_eur.lock()
    }

    // --- lifecycle checkpoint ---

    pub fn checkpoint(&self) -> Option<LifecycleCheckpoint> {
        *self.checkpoint.lock()
    }

    pub fn set_checkpoint(&self, checkpoint: LifecycleCheckpoint) {
        *self.checkpoint.lock() = Some(checkpoint);
    }

    // --- snapshots ---

    pub fn snapshot(&self) -> MarketSnapshot {
        MarketSnapshot {
            tokens: self.tokens(),
            buffers: self.buffers.iter().map(|b| b.clone()).collect(),
            users: self.users(),
            positions: self.positions(),
            ledger: self.ledger.read().clone(),
            rankings: self.rankings.read().clone(),
            achievements: self.achievements.read().clone(),
            checkpoint: self.checkpoint(),
            liquidity_eur: self.liquidity_eur(),
            next_tx_id: self.next_tx_id.load(Ordering::SeqCst),
        }
    }

    pub fn from_snapshot(snapshot: MarketSnapshot) -> Self {
        let store = MarketStore::new();
        for token in snapshot.tokens {
            store.tokens.insert(token.id, token);
        }
        for buffer in snapshot.buffers {
            store.buffers.insert(buffer.token_id, buffer);
        }
        for user in snapshot.users {
            store.users.insert(user.id, user);
        }
        for position in snapshot.positions {
            store
                .positions
                .insert((position.user_id, position.token_id), position);
        }
        *store.ledger.write() = snapshot.ledger;
        *store.rankings.write() = snapshot.rankings;
        *store.achievements.write() = snapshot.achievements;
        *store.checkpoint.lock() = snapshot.checkpoint;
        *store.liquidity_eur.lock() = snapshot.liquidity_eur;
        store.next_tx_id.store(snapshot.next_tx_id, Ordering::SeqCst);
        store
    }
}

impl Default for MarketStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable image of the whole market state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub tokens: Vec<Token>,
    pub buffers: Vec<AdminBuffer>,
    pub users: Vec<User>,
    pub positions: Vec<Position>,
    pub ledger: Vec<TransactionRecord>,
    pub rankings: Vec<MonthlyRankingEntry>,
    pub achievements: Vec<MonthlyAchievement>,
    pub checkpoint: Option<LifecycleCheckpoint>,
    pub liquidity_eur: f64,
    pub next_tx_id: u64,
}
