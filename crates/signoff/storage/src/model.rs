use serde::{Deserialize, Serialize};
use signoff_types::{
    ActorId, BucketId, Collection, CollectionMetadata, CollectionRef, HistoryAppend, HistoryEntry,
    Record, Timestamp,
};
use std::collections::BTreeSet;

/// A named set of principals inside a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub bucket: BucketId,
    pub name: String,
    pub members: BTreeSet<ActorId>,
}

impl Group {
    pub fn new(bucket: BucketId, name: impl Into<String>) -> Self {
        Self {
            bucket,
            name: name.into(),
            members: BTreeSet::new(),
        }
    }

    pub fn with_members<I>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = ActorId>,
    {
        self.members.extend(members);
        self
    }
}

/// Compare-and-swap guard attached to a staged collection write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Precondition {
    /// The collection must not exist yet.
    Absent,
    /// The collection must exist with exactly this `last_modified`.
    Version(Timestamp),
    /// Create or update unconditionally.
    Any,
}

/// Staged write to one collection. Applied as a whole or not at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionWrite {
    pub reference: CollectionRef,
    pub precondition: Precondition,
    /// New collection version.
    pub last_modified: Timestamp,
    /// New records timestamp; unchanged when `None`.
    pub records_timestamp: Option<Timestamp>,
    /// Full replacement of the collection metadata.
    pub metadata: CollectionMetadata,
    /// Records (or tombstones) to upsert, keyed by id.
    pub records: Vec<Record>,
}

/// Staged removal of a collection and all its records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionDelete {
    pub reference: CollectionRef,
    pub precondition: Precondition,
}

/// Staged group creation; existing groups are left untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupEnsure {
    pub group: Group,
}

/// Everything one workflow step writes, committed atomically.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WriteBatch {
    pub collections: Vec<CollectionWrite>,
    pub deletes: Vec<CollectionDelete>,
    pub groups: Vec<GroupEnsure>,
    pub history: Vec<HistoryAppend>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
            && self.deletes.is_empty()
            && self.groups.is_empty()
            && self.history.is_empty()
    }
}

/// Outcome of a committed batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitReceipt {
    /// Collections as stored after the commit.
    pub collections: Vec<Collection>,
    /// History entries appended by the commit, in order.
    pub history: Vec<HistoryEntry>,
}

impl CommitReceipt {
    pub fn collection(&self, reference: &CollectionRef) -> Option<&Collection> {
        self.collections.iter().find(|c| &c.reference == reference)
    }
}
