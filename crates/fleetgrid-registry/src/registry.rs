//! Worker registry over the shared store.
//!
//! Records live at `worker:{id}`; the membership index is the set at
//! `workers:index`. Register writes the record before indexing it, and
//! deregister unindexes before deleting, so a reader walking the index
//! can only race toward seeing a worker that still exists. The two store
//! calls per mutation are not transactional; the inconsistency window is
//! bounded by a single call.

use std::sync::Arc;

use tracing::{debug, warn};

use fleetgrid_store::SharedStore;

use crate::error::{RegistryError, RegistryResult};
use crate::types::{WorkerRecord, WorkerStatus, epoch_secs};

/// Store key prefix for worker records, completed by the worker ID.
const WORKER_KEY_PREFIX: &str = "worker:";

/// Store key of the membership index set.
const WORKER_INDEX_KEY: &str = "workers:index";

/// The authoritative view of the worker fleet.
#[derive(Clone)]
pub struct WorkerRegistry {
    store: Arc<dyn SharedStore>,
}

impl WorkerRegistry {
    /// Create a registry over the given store.
    pub fn new(store: Arc<dyn SharedStore>) -> Self {
        Self { store }
    }

    /// Insert or overwrite a worker's record and index its ID.
    ///
    /// Idempotent: re-registering an ID replaces its prior record and
    /// leaves exactly one index entry.
    pub fn register(&self, record: WorkerRecord) -> RegistryResult<WorkerRecord> {
        validate_id(&record.id)?;
        let value = serde_json::to_vec(&record)?;
        // Record first, index second: an indexed ID always resolves.
        self.store.put(&record_key(&record.id), &value)?;
        self.store.set_add(WORKER_INDEX_KEY, &record.id)?;
        debug!(worker_id = %record.id, "worker registered");
        Ok(record)
    }

    /// Remove a worker from the index and delete its record.
    ///
    /// Unknown IDs are a no-op, not an error.
    pub fn deregister(&self, id: &str) -> RegistryResult<()> {
        validate_id(id)?;
        // Reverse of register: unindex first so the record outlives its
        // index entry.
        self.store.set_remove(WORKER_INDEX_KEY, id)?;
        self.store.delete(&record_key(id))?;
        debug!(worker_id = %id, "worker deregistered");
        Ok(())
    }

    /// Apply a health report: refresh the heartbeat, take the reported
    /// processed count, and mark the worker active.
    ///
    /// Returns `Ok(None)` for unknown IDs. Read-modify-write with no
    /// cross-worker coordination; racing a concurrent `deregister` of
    /// the same ID may write the record back after its deletion. That
    /// resurrection is accepted, the next deregister clears it.
    pub fn update_health(
        &self,
        id: &str,
        processed_count: u64,
    ) -> RegistryResult<Option<WorkerRecord>> {
        validate_id(id)?;
        let key = record_key(id);
        let Some(bytes) = self.store.get(&key)? else {
            return Ok(None);
        };
        let mut record: WorkerRecord = match serde_json::from_slice(&bytes) {
            Ok(record) => record,
            Err(e) => {
                warn!(worker_id = %id, error = %e, "undecodable worker record, treating as unknown");
                return Ok(None);
            }
        };
        record.last_heartbeat = epoch_secs();
        record.processed_count = processed_count;
        record.status = WorkerStatus::Active;
        let value = serde_json::to_vec(&record)?;
        self.store.put(&key, &value)?;
        debug!(worker_id = %id, processed_count, "worker health updated");
        Ok(Some(record))
    }

    /// All currently-known worker records.
    ///
    /// Best-effort: an index read failure degrades to an empty list, a
    /// failed batch fetch falls back to per-worker reads, and IDs whose
    /// record is missing (already deregistered) or undecodable are
    /// dropped rather than failing the call.
    pub fn list_all(&self) -> RegistryResult<Vec<WorkerRecord>> {
        let ids = match self.store.set_members(WORKER_INDEX_KEY) {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "worker index read failed, reporting no workers");
                return Ok(Vec::new());
            }
        };
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = ids.iter().map(|id| record_key(id)).collect();
        let fetched = match self.store.batch_get(&keys) {
            Ok(values) => values,
            Err(e) => {
                warn!(error = %e, "batch fetch failed, falling back to per-worker reads");
                keys.iter()
                    .map(|key| match self.store.get(key) {
                        Ok(value) => value,
                        Err(e) => {
                            debug!(%key, error = %e, "worker record fetch failed");
                            None
                        }
                    })
                    .collect()
            }
        };

        let mut records = Vec::with_capacity(ids.len());
        for (id, value) in ids.iter().zip(fetched) {
            let Some(bytes) = value else {
                // Indexed but recordless: deregistered under us.
                continue;
            };
            match serde_json::from_slice::<WorkerRecord>(&bytes) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(worker_id = %id, error = %e, "dropping undecodable worker record");
                }
            }
        }
        Ok(records)
    }
}

fn record_key(id: &str) -> String {
    format!("{WORKER_KEY_PREFIX}{id}")
}

fn validate_id(id: &str) -> RegistryResult<()> {
    if id.trim().is_empty() {
        return Err(RegistryError::InvalidInput(
            "worker id must not be blank".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use fleetgrid_store::{EmbeddedStore, StoreError, StoreResult};

    fn test_registry() -> (WorkerRegistry, Arc<EmbeddedStore>) {
        let store = Arc::new(EmbeddedStore::open_in_memory().unwrap());
        (WorkerRegistry::new(store.clone()), store)
    }

    // ── Register / deregister ──────────────────────────────────────

    #[test]
    fn register_and_list() {
        let (registry, _) = test_registry();

        registry.register(WorkerRecord::new("w-1")).unwrap();
        registry.register(WorkerRecord::new("w-2")).unwrap();

        let mut workers = registry.list_all().unwrap();
        workers.sort_by(|a, b| a.id.cmp(&b.id));
        assert_eq!(workers.len(), 2);
        assert_eq!(workers[0].id, "w-1");
        assert_eq!(workers[0].status, WorkerStatus::Registered);
    }

    #[test]
    fn deregister_excludes_worker() {
        let (registry, _) = test_registry();

        registry.register(WorkerRecord::new("w-1")).unwrap();
        registry.deregister("w-1").unwrap();

        assert!(registry.list_all().unwrap().is_empty());
    }

    #[test]
    fn deregister_unknown_is_noop() {
        let (registry, _) = test_registry();
        registry.deregister("ghost").unwrap();
    }

    #[test]
    fn reregister_is_idempotent() {
        let (registry, store) = test_registry();

        let mut record = WorkerRecord::new("w-1");
        record.processed_count = 10;
        registry.register(record).unwrap();

        let mut record = WorkerRecord::new("w-1");
        record.processed_count = 99;
        registry.register(record).unwrap();

        // Exactly one index entry and one record, with the second write's
        // state.
        assert_eq!(store.set_members("workers:index").unwrap().len(), 1);
        let workers = registry.list_all().unwrap();
        assert_eq!(workers.len(), 1);
        assert_eq!(workers[0].processed_count, 99);
    }

    #[test]
    fn blank_ids_are_rejected_before_the_store() {
        let (registry, store) = test_registry();

        assert!(matches!(
            registry.register(WorkerRecord::new("  ")),
            Err(RegistryError::InvalidInput(_))
        ));
        assert!(matches!(
            registry.deregister(""),
            Err(RegistryError::InvalidInput(_))
        ));
        assert!(matches!(
            registry.update_health(" ", 5),
            Err(RegistryError::InvalidInput(_))
        ));
        assert!(store.set_members("workers:index").unwrap().is_empty());
    }

    // ── Health updates ─────────────────────────────────────────────

    #[test]
    fn update_health_refreshes_record() {
        let (registry, _) = test_registry();
        registry.register(WorkerRecord::new("w-1")).unwrap();

        let updated = registry.update_health("w-1", 42).unwrap().unwrap();
        assert_eq!(updated.status, WorkerStatus::Active);
        assert_eq!(updated.processed_count, 42);

        // The stored record matches what was returned.
        let listed = registry.list_all().unwrap();
        assert_eq!(listed[0], updated);
    }

    #[test]
    fn update_health_unknown_returns_none_without_side_effects() {
        let (registry, store) = test_registry();

        assert!(registry.update_health("ghost", 5).unwrap().is_none());
        assert_eq!(store.get("worker:ghost").unwrap(), None);
        assert!(store.set_members("workers:index").unwrap().is_empty());
    }

    #[test]
    fn update_health_is_last_write_wins() {
        let (registry, _) = test_registry();
        registry.register(WorkerRecord::new("w-1")).unwrap();

        registry.update_health("w-1", 100).unwrap();
        registry.update_health("w-1", 50).unwrap();

        assert_eq!(registry.list_all().unwrap()[0].processed_count, 50);
    }

    // ── Degraded reads ─────────────────────────────────────────────

    #[test]
    fn list_all_drops_recordless_ids() {
        let (registry, store) = test_registry();
        registry.register(WorkerRecord::new("w-1")).unwrap();
        registry.register(WorkerRecord::new("w-2")).unwrap();

        // Simulate the window of a concurrent deregister: record gone,
        // index entry still present.
        store.delete("worker:w-2").unwrap();

        let workers = registry.list_all().unwrap();
        assert_eq!(workers.len(), 1);
        assert_eq!(workers[0].id, "w-1");
    }

    #[test]
    fn list_all_drops_undecodable_records() {
        let (registry, store) = test_registry();
        registry.register(WorkerRecord::new("w-1")).unwrap();

        store.put("worker:w-2", b"not json").unwrap();
        store.set_add("workers:index", "w-2").unwrap();

        let workers = registry.list_all().unwrap();
        assert_eq!(workers.len(), 1);
        assert_eq!(workers[0].id, "w-1");
    }

    // ── Failure semantics ──────────────────────────────────────────

    /// A store that fails every operation.
    struct FailingStore;

    impl SharedStore for FailingStore {
        fn incr(&self, _key: &str, _ttl: Duration) -> StoreResult<u64> {
            Err(StoreError::Unavailable("injected".into()))
        }
        fn counter(&self, _key: &str) -> StoreResult<Option<u64>> {
            Err(StoreError::Unavailable("injected".into()))
        }
        fn get(&self, _key: &str) -> StoreResult<Option<Vec<u8>>> {
            Err(StoreError::Unavailable("injected".into()))
        }
        fn put(&self, _key: &str, _value: &[u8]) -> StoreResult<()> {
            Err(StoreError::Unavailable("injected".into()))
        }
        fn batch_get(&self, _keys: &[String]) -> StoreResult<Vec<Option<Vec<u8>>>> {
            Err(StoreError::Unavailable("injected".into()))
        }
        fn set_add(&self, _set: &str, _member: &str) -> StoreResult<()> {
            Err(StoreError::Unavailable("injected".into()))
        }
        fn set_remove(&self, _set: &str, _member: &str) -> StoreResult<()> {
            Err(StoreError::Unavailable("injected".into()))
        }
        fn set_members(&self, _set: &str) -> StoreResult<Vec<String>> {
            Err(StoreError::Unavailable("injected".into()))
        }
        fn delete(&self, _key: &str) -> StoreResult<()> {
            Err(StoreError::Unavailable("injected".into()))
        }
    }

    /// Delegates to an embedded store but fails batch reads.
    struct NoBatchStore {
        inner: EmbeddedStore,
    }

    impl SharedStore for NoBatchStore {
        fn incr(&self, key: &str, ttl: Duration) -> StoreResult<u64> {
            self.inner.incr(key, ttl)
        }
        fn counter(&self, key: &str) -> StoreResult<Option<u64>> {
            self.inner.counter(key)
        }
        fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
            self.inner.get(key)
        }
        fn put(&self, key: &str, value: &[u8]) -> StoreResult<()> {
            self.inner.put(key, value)
        }
        fn batch_get(&self, _keys: &[String]) -> StoreResult<Vec<Option<Vec<u8>>>> {
            Err(StoreError::Unavailable("injected".into()))
        }
        fn set_add(&self, set: &str, member: &str) -> StoreResult<()> {
            self.inner.set_add(set, member)
        }
        fn set_remove(&self, set: &str, member: &str) -> StoreResult<()> {
            self.inner.set_remove(set, member)
        }
        fn set_members(&self, set: &str) -> StoreResult<Vec<String>> {
            self.inner.set_members(set)
        }
        fn delete(&self, key: &str) -> StoreResult<()> {
            self.inner.delete(key)
        }
    }

    #[test]
    fn mutations_propagate_store_failures() {
        let registry = WorkerRegistry::new(Arc::new(FailingStore));

        assert!(matches!(
            registry.register(WorkerRecord::new("w-1")),
            Err(RegistryError::Unavailable(_))
        ));
        assert!(matches!(
            registry.deregister("w-1"),
            Err(RegistryError::Unavailable(_))
        ));
        assert!(matches!(
            registry.update_health("w-1", 5),
            Err(RegistryError::Unavailable(_))
        ));
    }

    #[test]
    fn list_all_degrades_to_empty_on_index_failure() {
        let registry = WorkerRegistry::new(Arc::new(FailingStore));
        assert!(registry.list_all().unwrap().is_empty());
    }

    #[test]
    fn list_all_falls_back_to_per_worker_reads() {
        let inner = EmbeddedStore::open_in_memory().unwrap();
        let registry = WorkerRegistry::new(Arc::new(NoBatchStore { inner }));

        registry.register(WorkerRecord::new("w-1")).unwrap();
        registry.register(WorkerRecord::new("w-2")).unwrap();

        // Batch reads fail, individual reads still serve the records.
        assert_eq!(registry.list_all().unwrap().len(), 2);
    }
}
