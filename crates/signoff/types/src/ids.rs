//! Identifiers: buckets, collections, actors and the logical clock

use serde::{Deserialize, Serialize};
use std::fmt;

// ── Bucket / Collection ──────────────────────────────────────────────

/// Identifier of a bucket (a namespace of collections and groups)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BucketId(pub String);

impl BucketId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BucketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a collection inside a bucket
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CollectionId(pub String);

impl CollectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Full address of a collection: `(bucket, collection)`
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CollectionRef {
    pub bucket: BucketId,
    pub collection: CollectionId,
}

impl CollectionRef {
    pub fn new(bucket: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            bucket: BucketId::new(bucket),
            collection: CollectionId::new(collection),
        }
    }

    /// Resource path of this collection, as exposed in history entries
    pub fn uri(&self) -> String {
        format!("/buckets/{}/collections/{}", self.bucket, self.collection)
    }

    /// Resource path of one record of this collection
    pub fn record_uri(&self, record_id: &str) -> String {
        format!("{}/records/{}", self.uri(), record_id)
    }
}

impl fmt::Display for CollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.collection)
    }
}

// ── Actor ────────────────────────────────────────────────────────────

/// Authenticated principal performing a request (e.g. `account:anna`)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(pub String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Principal used for writes performed by the workflow itself
    pub fn system() -> Self {
        Self(SYSTEM_PRINCIPAL.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Principal recorded for replication writes
pub const SYSTEM_PRINCIPAL: &str = "plugin:signoff";

// ── Logical clock ────────────────────────────────────────────────────

/// Millisecond logical timestamp; strictly increases on every mutation
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Current wall-clock time in epoch milliseconds
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp_millis().max(0) as u64)
    }

    /// Next timestamp after `self`: wall-clock time, but never less than `self + 1`
    pub fn next(self) -> Self {
        Self(Self::now().0.max(self.0 + 1))
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_uri() {
        let c = CollectionRef::new("main-workspace", "cid");
        assert_eq!(c.uri(), "/buckets/main-workspace/collections/cid");
        assert_eq!(
            c.record_uri("abc"),
            "/buckets/main-workspace/collections/cid/records/abc"
        );
        assert_eq!(c.to_string(), "main-workspace/cid");
    }

    #[test]
    fn test_timestamp_next_is_strictly_increasing() {
        let far_future = Timestamp(u64::MAX / 2);
        assert_eq!(far_future.next(), Timestamp(u64::MAX / 2 + 1));

        let past = Timestamp(1);
        assert!(past.next() > past);
    }
}
