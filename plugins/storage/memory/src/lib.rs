use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tokio::sync::RwLock;

use rutt_api::{CorrelationRecord, CorrelationStore, StoreError, StoreFuture, Update};

// ═══════════════════════════════════════════════════════════════
//  MemoryStore
// ═══════════════════════════════════════════════════════════════

/// In-memory store. Records live as long as the process; для тестов
/// и для развёртываний, которым не нужна persistence.
///
/// Every write holds the map's write lock for the whole
/// read-modify-write, so merges of the same record are serialized.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, CorrelationRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records, created or upserted.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl CorrelationStore for MemoryStore {
    fn init(&self) -> StoreFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }

    fn insert(&self, id: &str, record: CorrelationRecord) -> StoreFuture<'_, ()> {
        let id = id.to_string();
        Box::pin(async move {
            let mut records = self.records.write().await;
            match records.entry(id) {
                Entry::Occupied(e) => Err(StoreError::duplicate_key(e.key())),
                Entry::Vacant(e) => {
                    e.insert(record);
                    Ok(())
                }
            }
        })
    }

    fn merge(&self, id: &str, update: &Update) -> StoreFuture<'_, ()> {
        let id = id.to_string();
        let update = update.clone();
        Box::pin(async move {
            let mut records = self.records.write().await;
            match records.get_mut(&id) {
                // merge_at never half-applies, so in-place is safe.
                Some(record) => record.apply(&update),
                None => {
                    let mut record = CorrelationRecord::upserted(&id);
                    record.apply(&update)?;
                    records.insert(id, record);
                    Ok(())
                }
            }
        })
    }

    fn get(&self, id: &str) -> StoreFuture<'_, Option<CorrelationRecord>> {
        let id = id.to_string();
        Box::pin(async move { Ok(self.records.read().await.get(&id).cloned()) })
    }

    fn close(&self) -> StoreFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rutt_api::{ErrorKind, FieldPath};
    use serde_json::json;

    use super::*;

    fn set_field(field: &str, value: &str) -> Update {
        Update::new(FieldPath::field(field).unwrap(), value)
    }

    #[tokio::test]
    async fn create_then_get_yields_exactly_id_and_source() {
        let store = MemoryStore::new();
        store
            .insert("c1", CorrelationRecord::created("c1", "s1"))
            .await
            .unwrap();

        let record = store.get("c1").await.unwrap().unwrap();
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"_id": "c1", "sourceId": "s1"})
        );
    }

    #[tokio::test]
    async fn second_create_fails_and_keeps_first() {
        let store = MemoryStore::new();
        store
            .insert("c1", CorrelationRecord::created("c1", "s1"))
            .await
            .unwrap();

        let err = store
            .insert("c1", CorrelationRecord::created("c1", "s2"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);

        let record = store.get("c1").await.unwrap().unwrap();
        assert_eq!(record.source_id(), Some("s1"));
    }

    #[tokio::test]
    async fn merge_on_missing_id_upserts_without_source() {
        let store = MemoryStore::new();
        store
            .merge("c1", &Update::new(FieldPath::time_queued(), "t0"))
            .await
            .unwrap();

        let record = store.get("c1").await.unwrap().unwrap();
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"_id": "c1", "timeQueued": "t0"})
        );

        // The upserted record now blocks creation.
        let err = store
            .insert("c1", CorrelationRecord::created("c1", "s1"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);
    }

    #[tokio::test]
    async fn conflicting_merge_persists_nothing() {
        let store = MemoryStore::new();
        store.merge("c1", &set_field("destinations", "flat")).await.unwrap();
        let before = store.get("c1").await.unwrap();

        let update = Update::new(FieldPath::destination_time_queued("d1", "m1").unwrap(), "t1");
        let err = store.merge("c1", &update).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PathConflict);
        assert_eq!(store.get("c1").await.unwrap(), before);
    }

    #[tokio::test]
    async fn merges_of_different_fields_accumulate() {
        let store = MemoryStore::new();
        store.merge("c1", &set_field("foo", "bar")).await.unwrap();
        store.merge("c1", &set_field("baz", "qux")).await.unwrap();

        let record = store.get("c1").await.unwrap().unwrap();
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"_id": "c1", "foo": "bar", "baz": "qux"})
        );
    }

    #[tokio::test]
    async fn destination_queued_then_updated() {
        let store = MemoryStore::new();
        store
            .merge(
                "c1",
                &Update::new(FieldPath::destination_time_queued("d1", "m1").unwrap(), "t1"),
            )
            .await
            .unwrap();
        store
            .merge(
                "c1",
                &Update::new(
                    FieldPath::destination_field("d1", "m1", "status").unwrap(),
                    "sent",
                ),
            )
            .await
            .unwrap();

        let record = store.get("c1").await.unwrap().unwrap();
        assert_eq!(
            serde_json::to_value(record.destination("d1", "m1").unwrap()).unwrap(),
            json!({"timeQueued": "t1", "status": "sent"})
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_disjoint_merges_are_not_lost() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert("c1", CorrelationRecord::created("c1", "s1"))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for i in 0..64 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .merge("c1", &set_field(&format!("f{i}"), &i.to_string()))
                    .await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }

        let record = store.get("c1").await.unwrap().unwrap();
        for i in 0..64 {
            assert_eq!(
                record.get(&FieldPath::field(&format!("f{i}")).unwrap()),
                Some(&json!(i.to_string()))
            );
        }
        assert_eq!(record.source_id(), Some("s1"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_same_path_merges_converge_to_one_value() {
        let store = Arc::new(MemoryStore::new());
        let path = FieldPath::destination_field("d1", "m1", "status").unwrap();

        let mut handles = Vec::new();
        for value in ["sent", "failed"] {
            let store = store.clone();
            let update = Update::new(path.clone(), value);
            handles.push(tokio::spawn(async move { store.merge("c1", &update).await }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }

        let record = store.get("c1").await.unwrap().unwrap();
        let status = record.get(&path).and_then(|v| v.as_str()).unwrap();
        assert!(status == "sent" || status == "failed");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_create_and_upsert_keep_both_writes() {
        for _ in 0..32 {
            let store = Arc::new(MemoryStore::new());
            let creator = {
                let store = store.clone();
                tokio::spawn(async move {
                    store.insert("c1", CorrelationRecord::created("c1", "s1")).await
                })
            };
            let updater = {
                let store = store.clone();
                tokio::spawn(async move {
                    store.merge("c1", &Update::new(FieldPath::time_queued(), "t1")).await
                })
            };
            let created = creator.await.unwrap();
            updater.await.unwrap().unwrap();

            let record = store.get("c1").await.unwrap().unwrap();
            assert_eq!(record.time_queued(), Some("t1"));
            // Either the create won the race, or it lost to the upsert.
            match created {
                Ok(()) => assert_eq!(record.source_id(), Some("s1")),
                Err(e) => {
                    assert_eq!(e.kind(), ErrorKind::DuplicateKey);
                    assert_eq!(record.source_id(), None);
                }
            }
        }
    }

    #[tokio::test]
    async fn get_missing_is_none() {
        let store = MemoryStore::new();
        assert!(store.get("nope").await.unwrap().is_none());
        assert!(store.is_empty().await);
    }
}
