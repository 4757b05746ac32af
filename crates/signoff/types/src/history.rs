//! History entries: the append-only audit feed of the workflow

use crate::{ActorId, CollectionRef, Timestamp};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Kind of change an entry records
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HistoryAction {
    Create,
    Update,
    Delete,
    /// A completed workflow status transition
    Transition,
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HistoryAction::Create => "create",
            HistoryAction::Update => "update",
            HistoryAction::Delete => "delete",
            HistoryAction::Transition => "transition",
        };
        f.write_str(s)
    }
}

/// Kind of resource an entry refers to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Collection,
    Record,
    Group,
}

/// History append payload. Sequence numbers and hashes are assigned by storage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryAppend {
    pub action: HistoryAction,
    pub resource_kind: ResourceKind,
    /// Resource path, e.g. `/buckets/b/collections/c/records/r`
    pub resource: String,
    pub actor: ActorId,
    pub timestamp: Timestamp,
    pub date: DateTime<Utc>,
    pub collection: CollectionRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    /// Snapshot of the resource after the change
    #[serde(default)]
    pub target: Value,
}

/// Persisted, tamper-evident history entry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub sequence: u64,
    #[serde(flatten)]
    pub event: HistoryAppend,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_hash: Option<String>,
    pub hash: String,
}
