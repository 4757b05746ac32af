//! Collections: review status, workflow-owned metadata and versioning

use crate::{ActorId, CollectionRef, Signature, Timestamp};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── Status ───────────────────────────────────────────────────────────

/// Review status of a source collection.
///
/// Only `WorkInProgress`, `ToReview` and `Signed` are ever stored; the
/// other values are requests that the workflow resolves immediately.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollectionStatus {
    #[default]
    WorkInProgress,
    ToReview,
    ToSign,
    Signed,
    ToResign,
    ToRollback,
}

impl CollectionStatus {
    /// Every status, in declaration order
    pub const ALL: [CollectionStatus; 6] = [
        CollectionStatus::WorkInProgress,
        CollectionStatus::ToReview,
        CollectionStatus::ToSign,
        CollectionStatus::Signed,
        CollectionStatus::ToResign,
        CollectionStatus::ToRollback,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionStatus::WorkInProgress => "work-in-progress",
            CollectionStatus::ToReview => "to-review",
            CollectionStatus::ToSign => "to-sign",
            CollectionStatus::Signed => "signed",
            CollectionStatus::ToResign => "to-resign",
            CollectionStatus::ToRollback => "to-rollback",
        }
    }

    /// Whether this value can be persisted as a collection status
    pub fn is_resting(&self) -> bool {
        matches!(
            self,
            CollectionStatus::WorkInProgress | CollectionStatus::ToReview | CollectionStatus::Signed
        )
    }
}

impl fmt::Display for CollectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CollectionStatus::ALL
            .iter()
            .find(|status| status.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown status '{}'", s))
    }
}

// ── Review diff ──────────────────────────────────────────────────────

/// Record ids changed in source relative to destination at review time
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub created: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub updated: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deleted: Vec<String>,
}

impl DiffSummary {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }

    pub fn len(&self) -> usize {
        self.created.len() + self.updated.len() + self.deleted.len()
    }
}

// ── Metadata ─────────────────────────────────────────────────────────

/// Collection attributes owned by the workflow.
///
/// Nothing but the workflow mutates `status` or the `last_*` fields.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionMetadata {
    /// Review status; `None` on collections the workflow does not manage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CollectionStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_edit_by: Option<ActorId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_edit_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_review_request_by: Option<ActorId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_review_request_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reviewer: Option<ActorId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_review_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_signature_by: Option<ActorId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_signature_date: Option<DateTime<Utc>>,
    /// Signature over the records of this collection (preview/destination)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
    /// Pending changes shown to reviewers while `to-review`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_diff: Option<DiffSummary>,
}

impl CollectionMetadata {
    /// Metadata of a freshly provisioned source collection
    pub fn work_in_progress() -> Self {
        Self {
            status: Some(CollectionStatus::WorkInProgress),
            ..Default::default()
        }
    }

    pub fn status(&self) -> CollectionStatus {
        self.status.unwrap_or_default()
    }

    /// Drop the attributes describing a pending review request
    pub fn clear_review_request(&mut self) {
        self.last_review_request_by = None;
        self.last_review_request_date = None;
        self.review_diff = None;
    }
}

// ── Collection ───────────────────────────────────────────────────────

/// A versioned record container and its workflow metadata.
///
/// `last_modified` advances on any mutation (records or metadata) and is the
/// compare-and-swap key. `records_timestamp` advances only when the record
/// set changes (or a signature refresh touches it) and is the timestamp that
/// signatures are bound to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    #[serde(flatten)]
    pub reference: CollectionRef,
    pub last_modified: Timestamp,
    pub records_timestamp: Timestamp,
    #[serde(default)]
    pub metadata: CollectionMetadata,
}

impl Collection {
    pub fn new(reference: CollectionRef, metadata: CollectionMetadata, now: Timestamp) -> Self {
        Self {
            reference,
            last_modified: now,
            records_timestamp: now,
            metadata,
        }
    }

    pub fn status(&self) -> CollectionStatus {
        self.metadata.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in CollectionStatus::ALL {
            assert_eq!(status.as_str().parse::<CollectionStatus>(), Ok(status));
        }
        assert!("published".parse::<CollectionStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        let value = serde_json::to_value(CollectionStatus::WorkInProgress).unwrap();
        assert_eq!(value, serde_json::json!("work-in-progress"));
    }

    #[test]
    fn test_only_three_statuses_rest() {
        let resting: Vec<_> = CollectionStatus::ALL
            .into_iter()
            .filter(CollectionStatus::is_resting)
            .collect();
        assert_eq!(
            resting,
            vec![
                CollectionStatus::WorkInProgress,
                CollectionStatus::ToReview,
                CollectionStatus::Signed
            ]
        );
    }

    #[test]
    fn test_clear_review_request() {
        let mut meta = CollectionMetadata::work_in_progress();
        meta.last_review_request_by = Some(ActorId::new("anna"));
        meta.last_review_request_date = Some(Utc::now());
        meta.review_diff = Some(DiffSummary::default());
        meta.clear_review_request();
        assert!(meta.last_review_request_by.is_none());
        assert!(meta.last_review_request_date.is_none());
        assert!(meta.review_diff.is_none());
    }
}
