//! Replication between source, preview and destination collections
//!
//! Nothing here writes. Record sets are read in pages, diffed, and turned
//! into a [`SyncPlan`]: the records a target must receive plus the live set
//! it will hold afterwards, which is what gets signed. The caller stages the
//! plan into the same batch as the signature and metadata updates.

use signoff_storage::{CollectionStore, QueryWindow};
use signoff_types::{CollectionRef, DiffSummary, Record, SignoffResult, Timestamp};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Record-level difference between a wanted set and a current set
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordDiff {
    /// Present in wanted only
    pub created: Vec<Record>,
    /// Present in both with different content
    pub updated: Vec<Record>,
    /// Ids present in current only
    pub deleted: Vec<String>,
}

impl RecordDiff {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }

    pub fn len(&self) -> usize {
        self.created.len() + self.updated.len() + self.deleted.len()
    }

    pub fn summary(&self) -> DiffSummary {
        DiffSummary {
            created: self.created.iter().map(|r| r.id.clone()).collect(),
            updated: self.updated.iter().map(|r| r.id.clone()).collect(),
            deleted: self.deleted.clone(),
        }
    }
}

/// Changes that turn `current` into `wanted`. Timestamps are ignored.
pub fn diff(wanted: &[Record], current: &[Record]) -> RecordDiff {
    let current_by_id: BTreeMap<&str, &Record> = current
        .iter()
        .filter(|r| !r.is_tombstone())
        .map(|r| (r.id.as_str(), r))
        .collect();
    let wanted_by_id: BTreeMap<&str, &Record> = wanted
        .iter()
        .filter(|r| !r.is_tombstone())
        .map(|r| (r.id.as_str(), r))
        .collect();

    let mut result = RecordDiff::default();
    for (id, record) in &wanted_by_id {
        match current_by_id.get(id) {
            None => result.created.push((*record).clone()),
            Some(existing) if !existing.same_content(record) => {
                result.updated.push((*record).clone())
            }
            Some(_) => {}
        }
    }
    result.deleted = current_by_id
        .keys()
        .filter(|id| !wanted_by_id.contains_key(*id))
        .map(|id| id.to_string())
        .collect();
    result
}

/// Staged replication of a record set onto a target
#[derive(Clone, Debug, Default)]
pub struct SyncPlan {
    pub diff: RecordDiff,
    /// Records and tombstones to write, stamped with the sync timestamp
    pub writes: Vec<Record>,
    /// Live records of the target once `writes` are applied, ordered by id
    pub result: Vec<Record>,
}

impl SyncPlan {
    /// Plan making `current` equal to `wanted` at `timestamp`
    pub fn new(wanted: &[Record], current: &[Record], timestamp: Timestamp) -> Self {
        let diff = diff(wanted, current);

        let mut writes = Vec::with_capacity(diff.len());
        for record in diff.created.iter().chain(diff.updated.iter()) {
            let mut copy = record.clone();
            copy.last_modified = timestamp;
            writes.push(copy);
        }
        for id in &diff.deleted {
            writes.push(Record::tombstone(id.clone(), timestamp));
        }

        let mut result: BTreeMap<String, Record> = current
            .iter()
            .filter(|r| !r.is_tombstone())
            .map(|r| (r.id.clone(), r.clone()))
            .collect();
        for write in &writes {
            if write.is_tombstone() {
                result.remove(&write.id);
            } else {
                result.insert(write.id.clone(), write.clone());
            }
        }

        Self {
            diff,
            writes,
            result: result.into_values().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Paged reader of live record sets
pub struct Replicator<S: ?Sized> {
    storage: Arc<S>,
    chunk_size: usize,
}

impl<S: CollectionStore + ?Sized> Replicator<S> {
    pub fn new(storage: Arc<S>, chunk_size: usize) -> Self {
        Self {
            storage,
            chunk_size: chunk_size.max(1),
        }
    }

    /// All live records of a collection, read `chunk_size` at a time
    pub async fn read_all(&self, reference: &CollectionRef) -> SignoffResult<Vec<Record>> {
        let mut records = Vec::new();
        let mut offset = 0;
        loop {
            let page = self
                .storage
                .list_records(reference, QueryWindow::page(offset, self.chunk_size))
                .await?;
            let fetched = page.len();
            records.extend(page);
            if fetched < self.chunk_size {
                break;
            }
            offset += fetched;
        }
        tracing::debug!(
            collection = %reference,
            records = records.len(),
            chunk_size = self.chunk_size,
            "Record set loaded"
        );
        Ok(records)
    }

    /// Live records of a collection that may not exist yet
    pub async fn read_optional(
        &self,
        reference: &CollectionRef,
        exists: bool,
    ) -> SignoffResult<Vec<Record>> {
        if exists {
            self.read_all(reference).await
        } else {
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use signoff_storage::{CollectionWrite, InMemorySignoffStorage, Precondition, WriteBatch};
    use signoff_types::CollectionMetadata;

    fn record(id: &str, value: i64, ts: u64) -> Record {
        Record::new(
            id,
            json!({ "value": value }).as_object().cloned().unwrap(),
            Timestamp(ts),
        )
    }

    #[test]
    fn test_diff_ignores_timestamps_and_tombstones() {
        let wanted = vec![record("a", 1, 5), record("b", 2, 5), record("c", 3, 5)];
        let current = vec![
            record("a", 1, 1),
            record("b", 9, 1),
            record("d", 4, 1),
            Record::tombstone("c", Timestamp(2)),
        ];

        let diff = diff(&wanted, &current);
        assert_eq!(diff.summary().created, vec!["c"]);
        assert_eq!(diff.summary().updated, vec!["b"]);
        assert_eq!(diff.deleted, vec!["d"]);
        assert_eq!(diff.len(), 3);
    }

    #[test]
    fn test_plan_result_equals_wanted_set() {
        let wanted = vec![record("a", 1, 5), record("c", 3, 5)];
        let current = vec![record("a", 1, 1), record("b", 2, 1)];

        let plan = SyncPlan::new(&wanted, &current, Timestamp(10));
        assert_eq!(plan.writes.len(), 2);
        assert!(plan.writes.iter().all(|r| r.last_modified == Timestamp(10)));
        assert!(plan.writes.iter().any(|r| r.id == "b" && r.is_tombstone()));

        let ids: Vec<_> = plan.result.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        // Unchanged records keep their own timestamp.
        assert_eq!(plan.result[0].last_modified, Timestamp(1));
        assert!(diff(&wanted, &plan.result).is_empty());
    }

    #[test]
    fn test_plan_is_empty_when_in_sync() {
        let records = vec![record("a", 1, 1)];
        assert!(SyncPlan::new(&records, &records, Timestamp(2)).is_empty());
    }

    #[tokio::test]
    async fn test_read_all_pages_through_collection() {
        let storage = Arc::new(InMemorySignoffStorage::new());
        let reference = CollectionRef::new("stage", "cid");
        let records: Vec<_> = (0..7).map(|i| record(&format!("r{}", i), i, 1)).collect();
        storage
            .commit(WriteBatch {
                collections: vec![CollectionWrite {
                    reference: reference.clone(),
                    precondition: Precondition::Absent,
                    last_modified: Timestamp(1),
                    records_timestamp: Some(Timestamp(1)),
                    metadata: CollectionMetadata::default(),
                    records,
                }],
                ..Default::default()
            })
            .await
            .unwrap();

        for chunk_size in [1, 3, 7, 100] {
            let replicator = Replicator::new(storage.clone(), chunk_size);
            assert_eq!(replicator.read_all(&reference).await.unwrap().len(), 7);
        }
    }
}
