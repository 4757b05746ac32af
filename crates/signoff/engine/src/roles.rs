//! Role resolution and guard predicates
//!
//! Groups live in the source bucket. The predicates are plain functions over
//! `(actor, resolved groups, collection metadata, policy)` and return a
//! [`RoleCheck`] instead of failing early, so callers decide how to report.

use crate::transitions::Guard;
use signoff_storage::GroupStore;
use signoff_types::{
    ActorId, BucketId, CollectionMetadata, GroupKind, ScopePolicy, SignoffError, SignoffResult,
};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Outcome of a role predicate
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoleCheck {
    Granted,
    Denied(String),
}

impl RoleCheck {
    pub fn is_granted(&self) -> bool {
        matches!(self, RoleCheck::Granted)
    }

    pub fn into_result(self) -> SignoffResult<()> {
        match self {
            RoleCheck::Granted => Ok(()),
            RoleCheck::Denied(reason) => Err(SignoffError::Forbidden(reason)),
        }
    }
}

/// Editors and reviewers of one scope
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedRoles {
    pub editors: BTreeSet<ActorId>,
    pub reviewers: BTreeSet<ActorId>,
}

impl ResolvedRoles {
    pub fn is_editor(&self, actor: &ActorId) -> bool {
        self.editors.contains(actor)
    }

    pub fn is_reviewer(&self, actor: &ActorId) -> bool {
        self.reviewers.contains(actor)
    }
}

pub fn check_editor(actor: &ActorId, roles: &ResolvedRoles, policy: &ScopePolicy) -> RoleCheck {
    if !policy.group_check_enabled || roles.is_editor(actor) {
        return RoleCheck::Granted;
    }
    RoleCheck::Denied(format!(
        "{} is not a member of {}",
        actor,
        policy.group_name(GroupKind::Editors)
    ))
}

pub fn check_editor_or_reviewer(
    actor: &ActorId,
    roles: &ResolvedRoles,
    policy: &ScopePolicy,
) -> RoleCheck {
    if !policy.group_check_enabled || roles.is_editor(actor) || roles.is_reviewer(actor) {
        return RoleCheck::Granted;
    }
    RoleCheck::Denied(format!(
        "{} is neither in {} nor in {}",
        actor,
        policy.group_name(GroupKind::Editors),
        policy.group_name(GroupKind::Reviewers)
    ))
}

/// Reviewer membership, then the self-review rule.
///
/// The self-review rule holds whatever the group memberships are: an actor
/// in both groups still cannot approve their own review request.
pub fn check_reviewer(
    actor: &ActorId,
    roles: &ResolvedRoles,
    metadata: &CollectionMetadata,
    policy: &ScopePolicy,
) -> RoleCheck {
    if policy.group_check_enabled && !roles.is_reviewer(actor) {
        return RoleCheck::Denied(format!(
            "{} is not a member of {}",
            actor,
            policy.group_name(GroupKind::Reviewers)
        ));
    }
    if policy.to_review_enabled && metadata.last_review_request_by.as_ref() == Some(actor) {
        return RoleCheck::Denied(format!(
            "{} requested the review and cannot approve it",
            actor
        ));
    }
    RoleCheck::Granted
}

/// Evaluate a transition guard
pub fn check_guard(
    guard: Guard,
    actor: &ActorId,
    roles: &ResolvedRoles,
    metadata: &CollectionMetadata,
    policy: &ScopePolicy,
) -> RoleCheck {
    match guard {
        Guard::Editor => check_editor(actor, roles, policy),
        Guard::EditorOrReviewer => check_editor_or_reviewer(actor, roles, policy),
        Guard::Reviewer => check_reviewer(actor, roles, metadata, policy),
        Guard::Anyone => RoleCheck::Granted,
    }
}

/// Thin adapter over the group store
pub struct RoleResolver<S: ?Sized> {
    storage: Arc<S>,
}

impl<S: GroupStore + ?Sized> RoleResolver<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Members of a group; a missing group is an empty set
    pub async fn members_of(
        &self,
        bucket: &BucketId,
        group_name: &str,
    ) -> SignoffResult<BTreeSet<ActorId>> {
        let group = self.storage.get_group(bucket, group_name).await?;
        Ok(group.map(|g| g.members).unwrap_or_default())
    }

    /// Editors and reviewers of a scope.
    ///
    /// Nothing is read when group checks are off.
    pub async fn resolve(&self, policy: &ScopePolicy) -> SignoffResult<ResolvedRoles> {
        if !policy.group_check_enabled {
            return Ok(ResolvedRoles::default());
        }
        let bucket = &policy.source.bucket;
        Ok(ResolvedRoles {
            editors: self
                .members_of(bucket, policy.group_name(GroupKind::Editors))
                .await?,
            reviewers: self
                .members_of(bucket, policy.group_name(GroupKind::Reviewers))
                .await?,
        })
    }
}
