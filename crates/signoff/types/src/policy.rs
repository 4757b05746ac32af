//! Workflow policies: where a source replicates to and which guards apply

use crate::{BucketId, CollectionId, CollectionRef};
use serde::{Deserialize, Serialize};

/// Default template of the editors group name
pub const DEFAULT_EDITORS_GROUP: &str = "{collection_id}-editors";
/// Default template of the reviewers group name
pub const DEFAULT_REVIEWERS_GROUP: &str = "{collection_id}-reviewers";

/// A configured location: a bucket, optionally narrowed to one collection.
///
/// A location without `collection` is a per-bucket location; the collection
/// id is then inherited from the source collection being resolved.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceLocation {
    pub bucket: BucketId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<CollectionId>,
}

impl ResourceLocation {
    pub fn bucket(bucket: impl Into<String>) -> Self {
        Self {
            bucket: BucketId::new(bucket),
            collection: None,
        }
    }

    pub fn collection(bucket: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            bucket: BucketId::new(bucket),
            collection: Some(CollectionId::new(collection)),
        }
    }

    pub fn is_per_bucket(&self) -> bool {
        self.collection.is_none()
    }

    /// Concrete collection for a given source collection id
    pub fn resolve(&self, source_collection: &CollectionId) -> CollectionRef {
        CollectionRef {
            bucket: self.bucket.clone(),
            collection: self
                .collection
                .clone()
                .unwrap_or_else(|| source_collection.clone()),
        }
    }
}

/// Group kinds the workflow guards on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    Editors,
    Reviewers,
}

/// Fully resolved, immutable workflow policy for one source collection
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopePolicy {
    pub source: CollectionRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<CollectionRef>,
    pub destination: CollectionRef,
    /// Name of the signer key this scope is bound to
    pub signer: String,
    /// Enforce editors/reviewers group membership
    pub group_check_enabled: bool,
    /// Require a review (by someone else) before signing
    pub to_review_enabled: bool,
    pub editors_group: String,
    pub reviewers_group: String,
}

impl ScopePolicy {
    /// Resolved group name for a kind of role
    pub fn group_name(&self, kind: GroupKind) -> &str {
        match kind {
            GroupKind::Editors => &self.editors_group,
            GroupKind::Reviewers => &self.reviewers_group,
        }
    }
}

/// Expand a group name template for a source collection.
///
/// Supported placeholders: `{bucket_id}` and `{collection_id}`.
pub fn expand_group_template(template: &str, source: &CollectionRef) -> String {
    template
        .replace("{bucket_id}", source.bucket.as_str())
        .replace("{collection_id}", source.collection.as_str())
}
