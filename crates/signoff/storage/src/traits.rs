use crate::model::{CommitReceipt, Group, WriteBatch};
use crate::StorageResult;
use async_trait::async_trait;
use signoff_types::{BucketId, Collection, CollectionRef, HistoryEntry, Record, Timestamp};

/// Generic query window for paged reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryWindow {
    pub limit: usize,
    pub offset: usize,
}

impl QueryWindow {
    pub fn page(offset: usize, limit: usize) -> Self {
        Self { limit, offset }
    }

    /// Everything, no paging.
    pub fn all() -> Self {
        Self::default()
    }
}

/// Storage interface for versioned record collections.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Get collection attributes, `None` when it does not exist.
    async fn get_collection(&self, reference: &CollectionRef) -> StorageResult<Option<Collection>>;

    /// Live records (tombstones excluded), ordered by id.
    async fn list_records(
        &self,
        reference: &CollectionRef,
        window: QueryWindow,
    ) -> StorageResult<Vec<Record>>;

    /// Records and tombstones modified strictly after `since`, oldest first.
    async fn changes_since(
        &self,
        reference: &CollectionRef,
        since: Timestamp,
    ) -> StorageResult<Vec<Record>>;

    /// Apply a staged batch atomically.
    ///
    /// Every precondition is checked before anything is written; a failed
    /// precondition yields `StorageError::Conflict` and no change at all.
    async fn commit(&self, batch: WriteBatch) -> StorageResult<CommitReceipt>;
}

/// Storage interface for bucket groups.
#[async_trait]
pub trait GroupStore: Send + Sync {
    async fn get_group(&self, bucket: &BucketId, name: &str) -> StorageResult<Option<Group>>;

    /// Create or replace a group.
    async fn put_group(&self, group: Group) -> StorageResult<()>;
}

/// Read side of the append-only history feed.
///
/// Appends only happen through [`CollectionStore::commit`].
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Entries in append order, optionally restricted to one bucket.
    async fn list_history(
        &self,
        bucket: Option<&BucketId>,
        window: QueryWindow,
    ) -> StorageResult<Vec<HistoryEntry>>;

    /// Hash of the latest entry.
    async fn latest_history_hash(&self) -> StorageResult<Option<String>>;
}

/// Unified storage bundle used by the signoff workflow.
pub trait SignoffStorage: CollectionStore + GroupStore + HistoryStore + Send + Sync {}

impl<T> SignoffStorage for T where T: CollectionStore + GroupStore + HistoryStore + Send + Sync {}
