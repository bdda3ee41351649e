//! File-based snapshot persistence
//!
//! The market state lives in memory; a snapshot is written on demand (and
//! by the operator before restarts). Each snapshot is stored twice: JSON as
//! a human-readable backup, bincode for fast loading.

use crate::store::{MarketSnapshot, MarketStore};
use markt_core::{MarketError, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub struct SnapshotStore {
    data_dir: PathBuf,
}

impl SnapshotStore {
    /// Open the snapshot directory, creating it if needed
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data_dir = path.as_ref().to_path_buf();
        if !data_dir.exists() {
            fs::create_dir_all(&data_dir)
                .map_err(|e| MarketError::Storage(format!("create {}: {}", data_dir.display(), e)))?;
        }
        Ok(SnapshotStore { data_dir })
    }

    /// Write the market state under the given snapshot name
    pub fn save(&self, name: &str, store: &MarketStore) -> Result<()> {
        let snapshot = store.snapshot();

        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| MarketError::Serialization(e.to_string()))?;
        fs::write(self.json_path(name), json)
            .map_err(|e| MarketError::Storage(format!("write snapshot {}: {}", name, e)))?;

        let bin = bincode::serialize(&snapshot)
            .map_err(|e| MarketError::Serialization(e.to_string()))?;
        fs::write(self.bin_path(name), bin)
            .map_err(|e| MarketError::Storage(format!("write snapshot {}: {}", name, e)))?;

        Ok(())
    }

    /// Load a named snapshot into a fresh store. Tries bincode first and
    /// falls back to the JSON copy.
    pub fn load(&self, name: &str) -> Result<MarketStore> {
        let bin_path = self.bin_path(name);
        if bin_path.exists() {
            let data = fs::read(&bin_path)
                .map_err(|e| MarketError::Storage(format!("read snapshot {}: {}", name, e)))?;
            let snapshot: MarketSnapshot = bincode::deserialize(&data)
                .map_err(|e| MarketError::Serialization(e.to_string()))?;
            return Ok(MarketStore::from_snapshot(snapshot));
        }

        let json_path = self.json_path(name);
        if json_path.exists() {
            let data = fs::read_to_string(&json_path)
                .map_err(|e| MarketError::Storage(format!("read snapshot {}: {}", name, e)))?;
            let snapshot: MarketSnapshot = serde_json::from_str(&data)
                .map_err(|e| MarketError::Serialization(e.to_string()))?;
            return Ok(MarketStore::from_snapshot(snapshot));
        }

        Err(MarketError::Storage(format!("snapshot not found: {}", name)))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.bin_path(name).exists() || self.json_path(name).exists()
    }

    fn json_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", name))
    }

    fn bin_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{}.bin", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use markt_core::{Role, Token, User};
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let snapshots = SnapshotStore::open(dir.path()).unwrap();

        let store = MarketStore::new();
        store
            .add_token(Token::new(1, "TST", 0.15, 0.00015, true, None, Utc::now()).unwrap())
            .unwrap();
        store
            .add_user(User::new(10, "alice", 150.0, Role::User))
            .unwrap();
        store.add_liquidity_eur(7.5);

        snapshots.save("market", &store).unwrap();
        let loaded = snapshots.load("market").unwrap();

        assert_eq!(loaded.tokens().len(), 1);
        assert_eq!(loaded.get_user(10).unwrap().balance_eur, 150.0);
        assert_eq!(loaded.liquidity_eur(), 7.5);
    }

    #[test]
    fn test_json_fallback() {
        let dir = tempdir().unwrap();
        let snapshots = SnapshotStore::open(dir.path()).unwrap();

        let store = MarketStore::new();
        store
            .add_user(User::new(10, "alice", 150.0, Role::User))
            .unwrap();
        snapshots.save("market", &store).unwrap();

        // drop the binary copy; the JSON backup must still load
        fs::remove_file(dir.path().join("market.bin")).unwrap();
        let loaded = snapshots.load("market").unwrap();
        assert_eq!(loaded.users().len(), 1);
    }

    #[test]
    fn test_missing_snapshot() {
        let dir = tempdir().unwrap();
        let snapshots = SnapshotStore::open(dir.path()).unwrap();
        assert!(!snapshots.exists("nope"));
        assert!(snapshots.load("nope").is_err());
    }
}
