//! In-memory reference implementation of the signoff storage traits.
//!
//! Deterministic and test-friendly. A batch commit holds the collection,
//! group and history locks (always taken in that order) only while it
//! checks preconditions and applies already-staged writes; no signing or
//! diffing ever happens under these locks.

use crate::model::{CommitReceipt, Group, Precondition, WriteBatch};
use crate::traits::{CollectionStore, GroupStore, HistoryStore, QueryWindow};
use crate::{StorageError, StorageResult};
use async_trait::async_trait;
use signoff_types::{
    BucketId, Collection, CollectionRef, HistoryAppend, HistoryEntry, Record, Timestamp,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::RwLock;

struct StoredCollection {
    collection: Collection,
    records: BTreeMap<String, Record>,
}

/// In-memory signoff storage adapter.
#[derive(Default)]
pub struct InMemorySignoffStorage {
    collections: RwLock<HashMap<CollectionRef, StoredCollection>>,
    groups: RwLock<HashMap<(BucketId, String), Group>>,
    history: RwLock<Vec<HistoryEntry>>,
}

impl InMemorySignoffStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CollectionStore for InMemorySignoffStorage {
    async fn get_collection(&self, reference: &CollectionRef) -> StorageResult<Option<Collection>> {
        let guard = self
            .collections
            .read()
            .map_err(|_| StorageError::Backend("collections lock poisoned".to_string()))?;
        Ok(guard.get(reference).map(|stored| stored.collection.clone()))
    }

    async fn list_records(
        &self,
        reference: &CollectionRef,
        window: QueryWindow,
    ) -> StorageResult<Vec<Record>> {
        let guard = self
            .collections
            .read()
            .map_err(|_| StorageError::Backend("collections lock poisoned".to_string()))?;
        let stored = guard
            .get(reference)
            .ok_or_else(|| StorageError::NotFound(format!("collection {}", reference)))?;
        let live = stored
            .records
            .values()
            .filter(|r| !r.is_tombstone())
            .cloned()
            .collect::<Vec<_>>();
        Ok(apply_window(live, window))
    }

    async fn changes_since(
        &self,
        reference: &CollectionRef,
        since: Timestamp,
    ) -> StorageResult<Vec<Record>> {
        let guard = self
            .collections
            .read()
            .map_err(|_| StorageError::Backend("collections lock poisoned".to_string()))?;
        let stored = guard
            .get(reference)
            .ok_or_else(|| StorageError::NotFound(format!("collection {}", reference)))?;
        let mut changes = stored
            .records
            .values()
            .filter(|r| r.last_modified > since)
            .cloned()
            .collect::<Vec<_>>();
        changes.sort_by(|a, b| a.last_modified.cmp(&b.last_modified).then(a.id.cmp(&b.id)));
        Ok(changes)
    }

    async fn commit(&self, batch: WriteBatch) -> StorageResult<CommitReceipt> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StorageError::Backend("collections lock poisoned".to_string()))?;
        let mut groups = self
            .groups
            .write()
            .map_err(|_| StorageError::Backend("groups lock poisoned".to_string()))?;
        let mut history = self
            .history
            .write()
            .map_err(|_| StorageError::Backend("history lock poisoned".to_string()))?;

        // Validate everything before touching anything.
        let mut touched = HashSet::new();
        for write in &batch.collections {
            if !touched.insert(write.reference.clone()) {
                return Err(StorageError::InvalidInput(format!(
                    "collection {} written twice in one batch",
                    write.reference
                )));
            }
            let current = collections.get(&write.reference).map(|s| &s.collection);
            check_precondition(&write.reference, write.precondition, current)?;
            if let Some(current) = current {
                if write.last_modified <= current.last_modified {
                    return Err(StorageError::InvalidInput(format!(
                        "collection {} version must increase ({} <= {})",
                        write.reference, write.last_modified, current.last_modified
                    )));
                }
            }
        }
        for delete in &batch.deletes {
            if !touched.insert(delete.reference.clone()) {
                return Err(StorageError::InvalidInput(format!(
                    "collection {} written twice in one batch",
                    delete.reference
                )));
            }
            let current = collections.get(&delete.reference).map(|s| &s.collection);
            if current.is_none() {
                return Err(StorageError::NotFound(format!(
                    "collection {}",
                    delete.reference
                )));
            }
            check_precondition(&delete.reference, delete.precondition, current)?;
        }

        // Apply.
        let mut stored_collections = Vec::with_capacity(batch.collections.len());
        for write in batch.collections {
            let records_timestamp = write.records_timestamp;
            let stored = collections
                .entry(write.reference.clone())
                .or_insert_with(|| StoredCollection {
                    collection: Collection::new(
                        write.reference.clone(),
                        write.metadata.clone(),
                        records_timestamp.unwrap_or(write.last_modified),
                    ),
                    records: BTreeMap::new(),
                });
            stored.collection.last_modified = write.last_modified;
            if let Some(ts) = records_timestamp {
                stored.collection.records_timestamp = ts;
            }
            stored.collection.metadata = write.metadata;
            for record in write.records {
                stored.records.insert(record.id.clone(), record);
            }
            stored_collections.push(stored.collection.clone());
        }
        for delete in batch.deletes {
            collections.remove(&delete.reference);
        }
        for ensure in batch.groups {
            let key = (ensure.group.bucket.clone(), ensure.group.name.clone());
            groups.entry(key).or_insert(ensure.group);
        }

        let mut appended = Vec::with_capacity(batch.history.len());
        for event in batch.history {
            let previous_hash = history.last().map(|e| e.hash.clone());
            let sequence = history.len() as u64 + 1;
            let hash = compute_history_hash(&event, previous_hash.as_deref(), sequence)?;
            let entry = HistoryEntry {
                sequence,
                event,
                previous_hash,
                hash,
            };
            history.push(entry.clone());
            appended.push(entry);
        }

        tracing::trace!(
            collections = stored_collections.len(),
            history = appended.len(),
            "Batch committed"
        );

        Ok(CommitReceipt {
            collections: stored_collections,
            history: appended,
        })
    }
}

#[async_trait]
impl GroupStore for InMemorySignoffStorage {
    async fn get_group(&self, bucket: &BucketId, name: &str) -> StorageResult<Option<Group>> {
        let guard = self
            .groups
            .read()
            .map_err(|_| StorageError::Backend("groups lock poisoned".to_string()))?;
        Ok(guard.get(&(bucket.clone(), name.to_string())).cloned())
    }

    async fn put_group(&self, group: Group) -> StorageResult<()> {
        let mut guard = self
            .groups
            .write()
            .map_err(|_| StorageError::Backend("groups lock poisoned".to_string()))?;
        guard.insert((group.bucket.clone(), group.name.clone()), group);
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for InMemorySignoffStorage {
    async fn list_history(
        &self,
        bucket: Option<&BucketId>,
        window: QueryWindow,
    ) -> StorageResult<Vec<HistoryEntry>> {
        let guard = self
            .history
            .read()
            .map_err(|_| StorageError::Backend("history lock poisoned".to_string()))?;
        let values = guard
            .iter()
            .filter(|e| bucket.map_or(true, |b| &e.event.collection.bucket == b))
            .cloned()
            .collect::<Vec<_>>();
        Ok(apply_window(values, window))
    }

    async fn latest_history_hash(&self) -> StorageResult<Option<String>> {
        let guard = self
            .history
            .read()
            .map_err(|_| StorageError::Backend("history lock poisoned".to_string()))?;
        Ok(guard.last().map(|e| e.hash.clone()))
    }
}

fn check_precondition(
    reference: &CollectionRef,
    precondition: Precondition,
    current: Option<&Collection>,
) -> StorageResult<()> {
    match (precondition, current) {
        (Precondition::Any, _) => Ok(()),
        (Precondition::Absent, None) => Ok(()),
        (Precondition::Absent, Some(_)) => Err(StorageError::Conflict(format!(
            "collection {} already exists",
            reference
        ))),
        (Precondition::Version(_), None) => Err(StorageError::Conflict(format!(
            "collection {} no longer exists",
            reference
        ))),
        (Precondition::Version(expected), Some(current)) if current.last_modified != expected => {
            Err(StorageError::Conflict(format!(
                "collection {} was modified (expected {}, found {})",
                reference, expected, current.last_modified
            )))
        }
        (Precondition::Version(_), Some(_)) => Ok(()),
    }
}

fn compute_history_hash(
    event: &HistoryAppend,
    previous_hash: Option<&str>,
    sequence: u64,
) -> StorageResult<String> {
    let serializable = serde_json::json!({
        "previous_hash": previous_hash,
        "sequence": sequence,
        "event": event,
    });
    let serialized = serde_json::to_vec(&serializable)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    Ok(blake3::hash(&serialized).to_hex().to_string())
}

fn apply_window<T>(items: Vec<T>, window: QueryWindow) -> Vec<T> {
    let iter = items.into_iter().skip(window.offset);
    if window.limit == 0 {
        iter.collect()
    } else {
        iter.take(window.limit).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CollectionDelete, CollectionWrite, GroupEnsure};
    use chrono::Utc;
    use signoff_types::{
        ActorId, CollectionMetadata, HistoryAction, ResourceKind, Timestamp,
    };

    fn source() -> CollectionRef {
        CollectionRef::new("stage", "cid")
    }

    fn record(id: &str, ts: u64) -> Record {
        Record::new(
            id,
            serde_json::json!({"title": id}).as_object().cloned().unwrap(),
            Timestamp(ts),
        )
    }

    fn create(reference: CollectionRef, ts: u64, records: Vec<Record>) -> WriteBatch {
        WriteBatch {
            collections: vec![CollectionWrite {
                reference,
                precondition: Precondition::Absent,
                last_modified: Timestamp(ts),
                records_timestamp: Some(Timestamp(ts)),
                metadata: CollectionMetadata::work_in_progress(),
                records,
            }],
            ..Default::default()
        }
    }

    fn event(action: HistoryAction, ts: u64) -> HistoryAppend {
        HistoryAppend {
            action,
            resource_kind: ResourceKind::Collection,
            resource: source().uri(),
            actor: ActorId::new("anna"),
            timestamp: Timestamp(ts),
            date: Utc::now(),
            collection: source(),
            record_id: None,
            target: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn create_then_list_records_in_id_order() {
        let storage = InMemorySignoffStorage::new();
        storage
            .commit(create(source(), 10, vec![record("b", 10), record("a", 10)]))
            .await
            .unwrap();

        let records = storage
            .list_records(&source(), QueryWindow::all())
            .await
            .unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        let page = storage
            .list_records(&source(), QueryWindow::page(1, 1))
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, "b");
    }

    #[tokio::test]
    async fn stale_version_is_rejected_without_partial_writes() {
        let storage = InMemorySignoffStorage::new();
        let preview = CollectionRef::new("preview", "cid");
        storage.commit(create(source(), 10, vec![])).await.unwrap();

        let batch = WriteBatch {
            collections: vec![
                CollectionWrite {
                    reference: preview.clone(),
                    precondition: Precondition::Any,
                    last_modified: Timestamp(20),
                    records_timestamp: Some(Timestamp(20)),
                    metadata: CollectionMetadata::default(),
                    records: vec![record("a", 20)],
                },
                CollectionWrite {
                    reference: source(),
                    precondition: Precondition::Version(Timestamp(9)),
                    last_modified: Timestamp(20),
                    records_timestamp: None,
                    metadata: CollectionMetadata::default(),
                    records: vec![],
                },
            ],
            history: vec![event(HistoryAction::Transition, 20)],
            ..Default::default()
        };

        let result = storage.commit(batch).await;
        assert!(matches!(result, Err(StorageError::Conflict(_))));
        assert!(storage.get_collection(&preview).await.unwrap().is_none());
        assert!(storage
            .list_history(None, QueryWindow::all())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn version_must_increase() {
        let storage = InMemorySignoffStorage::new();
        storage.commit(create(source(), 10, vec![])).await.unwrap();
        let batch = WriteBatch {
            collections: vec![CollectionWrite {
                reference: source(),
                precondition: Precondition::Version(Timestamp(10)),
                last_modified: Timestamp(10),
                records_timestamp: None,
                metadata: CollectionMetadata::default(),
                records: vec![],
            }],
            ..Default::default()
        };
        assert!(matches!(
            storage.commit(batch).await,
            Err(StorageError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn tombstones_show_in_changes_but_not_listing() {
        let storage = InMemorySignoffStorage::new();
        storage
            .commit(create(source(), 10, vec![record("a", 10), record("b", 10)]))
            .await
            .unwrap();
        storage
            .commit(WriteBatch {
                collections: vec![CollectionWrite {
                    reference: source(),
                    precondition: Precondition::Version(Timestamp(10)),
                    last_modified: Timestamp(11),
                    records_timestamp: Some(Timestamp(11)),
                    metadata: CollectionMetadata::work_in_progress(),
                    records: vec![Record::tombstone("a", Timestamp(11))],
                }],
                ..Default::default()
            })
            .await
            .unwrap();

        let live = storage
            .list_records(&source(), QueryWindow::all())
            .await
            .unwrap();
        assert_eq!(live.len(), 1);

        let changes = storage
            .changes_since(&source(), Timestamp(10))
            .await
            .unwrap();
        assert_eq!(changes.len(), 1);
        assert!(changes[0].is_tombstone());

        let collection = storage.get_collection(&source()).await.unwrap().unwrap();
        assert_eq!(collection.records_timestamp, Timestamp(11));
    }

    #[tokio::test]
    async fn history_chain_is_linked_and_filtered_by_bucket() {
        let storage = InMemorySignoffStorage::new();
        let mut batch = create(source(), 10, vec![]);
        batch.history = vec![
            event(HistoryAction::Create, 10),
            event(HistoryAction::Transition, 10),
        ];
        let receipt = storage.commit(batch).await.unwrap();
        assert_eq!(receipt.history.len(), 2);
        assert_eq!(
            receipt.history[1].previous_hash.as_deref(),
            Some(receipt.history[0].hash.as_str())
        );
        assert_eq!(receipt.history[1].sequence, 2);

        let stage = BucketId::new("stage");
        let other = BucketId::new("prod");
        assert_eq!(
            storage
                .list_history(Some(&stage), QueryWindow::all())
                .await
                .unwrap()
                .len(),
            2
        );
        assert!(storage
            .list_history(Some(&other), QueryWindow::all())
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            storage.latest_history_hash().await.unwrap(),
            Some(receipt.history[1].hash.clone())
        );
    }

    #[tokio::test]
    async fn ensure_group_keeps_existing_members() {
        let storage = InMemorySignoffStorage::new();
        let bucket = BucketId::new("stage");
        storage
            .put_group(
                Group::new(bucket.clone(), "cid-editors").with_members([ActorId::new("anna")]),
            )
            .await
            .unwrap();

        let batch = WriteBatch {
            groups: vec![GroupEnsure {
                group: Group::new(bucket.clone(), "cid-editors")
                    .with_members([ActorId::new("julia")]),
            }],
            ..Default::default()
        };
        storage.commit(batch).await.unwrap();

        let group = storage
            .get_group(&bucket, "cid-editors")
            .await
            .unwrap()
            .unwrap();
        assert!(group.members.contains(&ActorId::new("anna")));
        assert!(!group.members.contains(&ActorId::new("julia")));
    }

    #[tokio::test]
    async fn delete_removes_collection() {
        let storage = InMemorySignoffStorage::new();
        storage.commit(create(source(), 10, vec![])).await.unwrap();
        storage
            .commit(WriteBatch {
                deletes: vec![CollectionDelete {
                    reference: source(),
                    precondition: Precondition::Version(Timestamp(10)),
                }],
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(storage.get_collection(&source()).await.unwrap().is_none());
    }
}
