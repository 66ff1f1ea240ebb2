//! Asset Store
//!
//! Process-wide container for the asset collection. Mutations are strongly
//! typed methods; each committed mutation is written through to the state
//! storage when one is attached. Writes are serialized and each one snapshots
//! the state after taking the write lock, so the file never lags behind a
//! mutation that has already returned.

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::models::asset::{dedup_by_id, AssetCollectionState, AssetRecord, FetchStatus};
use crate::services::state_storage::StateStorage;

pub struct AssetStore {
    state: RwLock<AssetCollectionState>,
    storage: Option<StateStorage>,
    persist_lock: Mutex<()>,
}

impl AssetStore {
    /// Empty, in-memory only store
    pub fn new() -> Self {
        Self {
            state: RwLock::new(AssetCollectionState::default()),
            storage: None,
            persist_lock: Mutex::new(()),
        }
    }

    /// Store backed by `storage`, rehydrated from whatever it holds.
    /// Unreadable storage starts empty rather than failing startup.
    pub fn open(storage: StateStorage) -> Self {
        let state = match storage.load_state() {
            Ok(Some(state)) => {
                info!(
                    "Rehydrated {} assets (status: {:?}) from {}",
                    state.records.len(),
                    state.status,
                    storage.path().display()
                );
                state
            }
            Ok(None) => AssetCollectionState::default(),
            Err(e) => {
                warn!("Could not rehydrate asset state: {}", e);
                AssetCollectionState::default()
            }
        };

        Self {
            state: RwLock::new(state),
            storage: Some(storage),
            persist_lock: Mutex::new(()),
        }
    }

    pub fn snapshot(&self) -> AssetCollectionState {
        self.state.read().clone()
    }

    pub fn records(&self) -> Vec<AssetRecord> {
        self.state.read().records.clone()
    }

    pub fn status(&self) -> FetchStatus {
        self.state.read().status
    }

    /// Replace the whole collection with a fresh fetch result.
    /// Later records repeating an id are dropped.
    pub fn replace_all(&self, records: Vec<AssetRecord>) {
        let records = dedup_by_id(records);
        let count = records.len();
        self.commit(|state| {
            state.records = records;
            state.status = FetchStatus::Succeeded;
            state.error = None;
            state.updated_at = Some(Utc::now());
        });
        debug!("Replaced asset collection with {} records", count);
    }

    pub fn reset(&self) {
        self.commit(|state| {
            state.records.clear();
            state.status = FetchStatus::Idle;
            state.error = None;
            state.updated_at = None;
        });
        debug!("Asset collection reset");
    }

    /// Merge `record` over the stored record with the same id.
    /// Returns false (and changes nothing) when the id is unknown.
    pub fn update_one(&self, record: &AssetRecord) -> bool {
        let updated = {
            let mut state = self.state.write();
            match state.records.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => {
                    existing.merge_from(record);
                    true
                }
                None => false,
            }
        };

        if updated {
            self.persist();
            debug!("Updated asset '{}'", record.id);
        } else {
            debug!("Ignoring update for unknown asset '{}'", record.id);
        }
        updated
    }

    /// Record a failed list fetch. Existing records stay visible.
    pub fn record_failure(&self, error: &str) {
        self.commit(|state| {
            state.status = FetchStatus::Failed;
            state.error = Some(error.to_string());
        });
    }

    /// Write the current state to storage, if any
    pub fn persist(&self) {
        let Some(storage) = &self.storage else {
            return;
        };
        let _guard = self.persist_lock.lock();
        let snapshot = self.snapshot();
        if let Err(e) = storage.save_state(&snapshot) {
            warn!("Failed to persist asset state: {}", e);
        }
    }

    fn commit(&self, mutate: impl FnOnce(&mut AssetCollectionState)) {
        {
            let mut state = self.state.write();
            mutate(&mut *state);
        }
        self.persist();
    }
}

impl Default for AssetStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_assets() -> Vec<AssetRecord> {
        vec![
            AssetRecord::new("a", "Bitcoin", "BTC", "50000.4"),
            AssetRecord::new("b", "Ether", "ETH", "3000.1"),
        ]
    }

    #[test]
    fn test_new_store_is_idle_and_empty() {
        let store = AssetStore::new();
        let state = store.snapshot();
        assert!(state.records.is_empty());
        assert_eq!(state.status, FetchStatus::Idle);
        assert_eq!(state.error, None);
    }

    #[test]
    fn test_replace_all_sets_succeeded() {
        let store = AssetStore::new();
        store.record_failure("boom");
        store.replace_all(two_assets());

        let state = store.snapshot();
        assert_eq!(state.records, two_assets());
        assert_eq!(state.status, FetchStatus::Succeeded);
        assert_eq!(state.error, None);
        assert!(state.updated_at.is_some());
    }

    #[test]
    fn test_reset_clears_everything() {
        let store = AssetStore::new();
        store.replace_all(two_assets());
        store.record_failure("boom");
        store.reset();

        let state = store.snapshot();
        assert!(state.records.is_empty());
        assert_eq!(state.status, FetchStatus::Idle);
        assert_eq!(state.error, None);
        assert_eq!(state.updated_at, None);
        assert_eq!(state, AssetCollectionState::default());
    }

    #[test]
    fn test_reset_then_replace_empty_matches_replace_empty() {
        let a = AssetStore::new();
        a.replace_all(two_assets());
        a.reset();
        a.replace_all(vec![]);

        let b = AssetStore::new();
        b.replace_all(vec![]);

        assert_eq!(a.records(), b.records());
        assert_eq!(a.status(), b.status());
        assert_eq!(a.status(), FetchStatus::Succeeded);
    }

    #[test]
    fn test_update_one_merges_single_record() {
        let store = AssetStore::new();
        store.replace_all(two_assets());

        let patch = AssetRecord {
            id: "a".to_string(),
            price_usd: Some("51000.0".to_string()),
            ..Default::default()
        };
        assert!(store.update_one(&patch));

        let records = store.records();
        assert_eq!(records[0].price_usd.as_deref(), Some("51000.0"));
        assert_eq!(records[0].name.as_deref(), Some("Bitcoin"));
        assert_eq!(records[0].symbol.as_deref(), Some("BTC"));
        assert_eq!(records[1], two_assets()[1]);
    }

    #[test]
    fn test_replace_all_keeps_first_of_duplicate_ids() {
        let store = AssetStore::new();
        store.replace_all(vec![
            AssetRecord::new("a", "Bitcoin", "BTC", "50000.4"),
            AssetRecord::new("b", "Ether", "ETH", "3000.1"),
            AssetRecord::new("a", "Bitcoin Again", "BTC2", "1"),
        ]);
        assert_eq!(store.records(), two_assets());

        let patch = AssetRecord {
            id: "a".to_string(),
            price_usd: Some("2".to_string()),
            ..Default::default()
        };
        assert!(store.update_one(&patch));
        let prices: Vec<_> = store.records().into_iter().map(|r| r.price_usd).collect();
        assert_eq!(prices, vec![Some("2".to_string()), Some("3000.1".to_string())]);
    }

    #[test]
    fn test_update_one_unknown_id_is_noop() {
        let store = AssetStore::new();
        store.replace_all(two_assets());

        let patch = AssetRecord::new("zzz", "Ghost", "GHO", "1");
        assert!(!store.update_one(&patch));
        assert_eq!(store.records(), two_assets());
    }

    #[test]
    fn test_failure_keeps_records() {
        let store = AssetStore::new();
        store.replace_all(two_assets());
        store.record_failure("CoinCap API error 503");

        let state = store.snapshot();
        assert_eq!(state.records, two_assets());
        assert_eq!(state.status, FetchStatus::Failed);
        assert_eq!(state.error.as_deref(), Some("CoinCap API error 503"));
    }

    #[test]
    fn test_mutations_are_persisted_and_rehydrated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = AssetStore::open(StateStorage::new(&path));
        store.replace_all(two_assets());
        store.update_one(&AssetRecord {
            id: "b".to_string(),
            name: Some("Ethereum".to_string()),
            ..Default::default()
        });
        drop(store);

        let reopened = AssetStore::open(StateStorage::new(&path));
        let state = reopened.snapshot();
        assert_eq!(state.status, FetchStatus::Succeeded);
        assert_eq!(state.records.len(), 2);
        assert_eq!(state.records[1].name.as_deref(), Some("Ethereum"));

        reopened.reset();
        let again = AssetStore::open(StateStorage::new(&path));
        assert!(again.records().is_empty());
        assert_eq!(again.status(), FetchStatus::Idle);
    }

    #[test]
    fn test_concurrent_updates_leave_file_matching_memory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = AssetStore::open(StateStorage::new(&path));
        let ids: Vec<String> = (0..8).map(|i| format!("asset-{}", i)).collect();
        store.replace_all(
            ids.iter()
                .map(|id| AssetRecord::new(id, id, "SYM", "0"))
                .collect(),
        );

        std::thread::scope(|scope| {
            for (t, id) in ids.iter().enumerate() {
                let store = &store;
                scope.spawn(move || {
                    for n in 0..20 {
                        // Every thread also touches a shared record
                        for target in [id.as_str(), "asset-0"] {
                            store.update_one(&AssetRecord {
                                id: target.to_string(),
                                price_usd: Some(format!("{}.{}", t, n)),
                                ..Default::default()
                            });
                        }
                    }
                });
            }
        });

        let on_disk = StateStorage::new(&path).load_state().unwrap();
        assert_eq!(on_disk, Some(store.snapshot()));
        assert!(!path.with_extension("tmp").exists());

        let records = store.records();
        for (t, record) in records.iter().enumerate().skip(1) {
            assert_eq!(record.price_usd, Some(format!("{}.19", t)));
        }
    }

    #[test]
    fn test_open_with_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "garbage").unwrap();

        let store = AssetStore::open(StateStorage::new(&path));
        assert!(store.records().is_empty());
        assert_eq!(store.status(), FetchStatus::Idle);
    }
}
