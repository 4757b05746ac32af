//! Signoff workflow: the entry point for collection, record and status requests
//!
//! Every operation follows the same shape:
//! 1. Resolve the policy and read the current collections
//! 2. Validate (CAS version, transition table, role guards)
//! 3. Stage replication, signatures, metadata and history in one batch
//! 4. Commit the batch with compare-and-swap preconditions
//!
//! A failure before step 4 leaves storage untouched. A concurrent change
//! to any collection read in step 1 makes the commit fail with
//! `ConflictingUpdate`; the caller re-reads and retries.
//!
//! There is no lock across scopes; two scopes only meet in storage.

use crate::capabilities::Capabilities;
use crate::history::HistoryRecorder;
use crate::registry::{WorkflowConfig, WorkflowRegistry};
use crate::replication::{diff, Replicator, SyncPlan};
use crate::roles::{check_guard, RoleCheck, RoleResolver};
use crate::settings::SignoffSettings;
use crate::transitions::{self, Effect};
use chrono::{DateTime, Utc};
use signoff_signer::{sign_records, verify_records, SignerBackend};
use signoff_storage::{
    CollectionDelete, CollectionWrite, Group, GroupEnsure, Precondition, QueryWindow,
    SignoffStorage, WriteBatch,
};
use signoff_types::{
    ActorId, BucketId, Collection, CollectionMetadata, CollectionRef, CollectionStatus, GroupKind,
    HistoryAction, HistoryEntry, Record, RecordChange, SignoffError, SignoffResult, Timestamp,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

// ── Staging ──────────────────────────────────────────────────────────

/// Writes and history entries of one operation, committed together
struct Staged {
    batch: WriteBatch,
    history: HistoryRecorder,
}

impl Staged {
    fn new(date: DateTime<Utc>) -> Self {
        Self {
            batch: WriteBatch::new(),
            history: HistoryRecorder::new(date),
        }
    }

    fn into_batch(self) -> WriteBatch {
        let mut batch = self.batch;
        batch.history = self.history.into_entries();
        batch
    }
}

/// A preview or destination collection as read before staging
struct TargetState {
    reference: CollectionRef,
    collection: Option<Collection>,
    records: Vec<Record>,
}

impl TargetState {
    fn precondition(&self) -> Precondition {
        match &self.collection {
            Some(c) => Precondition::Version(c.last_modified),
            None => Precondition::Absent,
        }
    }

    fn next_timestamp(&self) -> Timestamp {
        self.collection
            .as_ref()
            .map(|c| c.last_modified.next())
            .unwrap_or_else(Timestamp::now)
    }

    fn exists(&self) -> bool {
        self.collection.is_some()
    }
}

/// Everything a transition effect reads and stages
struct Step<'a> {
    config: &'a WorkflowConfig,
    actor: &'a ActorId,
    /// New version of the source collection
    timestamp: Timestamp,
    date: DateTime<Utc>,
    metadata: CollectionMetadata,
    source_writes: Vec<Record>,
    staged: Staged,
}

// ── Workflow ─────────────────────────────────────────────────────────

/// The review-and-signoff workflow over a storage backend
pub struct SignoffWorkflow<S: SignoffStorage + ?Sized> {
    storage: Arc<S>,
    registry: WorkflowRegistry,
    roles: RoleResolver<S>,
    replicator: Replicator<S>,
}

impl<S: SignoffStorage + ?Sized> SignoffWorkflow<S> {
    pub fn new(storage: Arc<S>, registry: WorkflowRegistry) -> Self {
        let chunk_size = registry.replication_chunk_size();
        Self {
            roles: RoleResolver::new(storage.clone()),
            replicator: Replicator::new(storage.clone(), chunk_size),
            storage,
            registry,
        }
    }

    /// Validate `settings` into a registry and build the workflow
    pub fn from_settings(storage: Arc<S>, settings: &SignoffSettings) -> SignoffResult<Self> {
        let registry = WorkflowRegistry::from_settings(settings)?;
        Ok(Self::new(storage, registry))
    }

    pub fn registry(&self) -> &WorkflowRegistry {
        &self.registry
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities::from_registry(&self.registry)
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub async fn get_collection(&self, reference: &CollectionRef) -> SignoffResult<Collection> {
        self.storage
            .get_collection(reference)
            .await?
            .ok_or_else(|| SignoffError::CollectionNotFound(reference.clone()))
    }

    /// Live records of a collection, ordered by id
    pub async fn records(&self, reference: &CollectionRef) -> SignoffResult<Vec<Record>> {
        self.get_collection(reference).await?;
        self.replicator.read_all(reference).await
    }

    /// Records and tombstones modified after `since`, oldest first
    pub async fn changes_since(
        &self,
        reference: &CollectionRef,
        since: Timestamp,
    ) -> SignoffResult<Vec<Record>> {
        self.get_collection(reference).await?;
        Ok(self.storage.changes_since(reference, since).await?)
    }

    /// History feed in append order
    pub async fn history(
        &self,
        bucket: Option<&BucketId>,
        window: QueryWindow,
    ) -> SignoffResult<Vec<HistoryEntry>> {
        Ok(self.storage.list_history(bucket, window).await?)
    }

    /// Check the signature of a preview or destination collection against
    /// its current records, with the key of the source it is signed for.
    pub async fn verify_collection(&self, reference: &CollectionRef) -> SignoffResult<()> {
        let config = self.registry.resolve_target(reference)?;
        let collection = self.get_collection(reference).await?;
        let signature = collection.metadata.signature.as_ref().ok_or_else(|| {
            SignoffError::VerificationFailed(format!("{} carries no signature", reference))
        })?;
        let records = self.replicator.read_all(reference).await?;
        verify_records(
            config.signer.as_ref(),
            &records,
            collection.records_timestamp,
            signature,
        )?;
        Ok(())
    }

    // ── Collections ──────────────────────────────────────────────────

    /// Create a collection.
    ///
    /// On a managed source this also provisions what the workflow needs:
    /// the editors group (with the creator) and the reviewers group when
    /// missing, and signed empty preview and destination collections when
    /// missing.
    pub async fn create_collection(
        &self,
        scope: &CollectionRef,
        actor: &ActorId,
    ) -> SignoffResult<Collection> {
        let config = match self.registry.resolve(scope) {
            Ok(config) => Some(config),
            Err(SignoffError::NotConfigured { .. }) => None,
            Err(e) => return Err(e),
        };

        let now = Timestamp::now();
        let mut staged = Staged::new(Utc::now());
        let metadata = if config.is_some() {
            CollectionMetadata::work_in_progress()
        } else {
            CollectionMetadata::default()
        };
        let collection = Collection::new(scope.clone(), metadata.clone(), now);
        staged.batch.collections.push(CollectionWrite {
            reference: scope.clone(),
            precondition: Precondition::Absent,
            last_modified: now,
            records_timestamp: Some(now),
            metadata,
            records: Vec::new(),
        });
        staged.history.collection(HistoryAction::Create, &collection, actor);

        if let Some(config) = &config {
            let policy = &config.policy;
            for (kind, members) in [
                (GroupKind::Editors, vec![actor.clone()]),
                (GroupKind::Reviewers, Vec::new()),
            ] {
                let name = policy.group_name(kind);
                if self.storage.get_group(&scope.bucket, name).await?.is_some() {
                    continue;
                }
                let group = Group::new(scope.bucket.clone(), name).with_members(members);
                staged.history.group(scope, &group, now);
                staged.batch.groups.push(GroupEnsure { group });
            }

            let targets = policy.preview.iter().chain(std::iter::once(&policy.destination));
            for reference in targets {
                let target = self.load_target(reference).await?;
                if !target.exists() {
                    stage_signed_target(&target, None, config.signer.as_ref(), &mut staged)?;
                }
            }
        }

        let receipt = self.storage.commit(staged.into_batch()).await?;
        tracing::info!(
            bucket = %scope.bucket,
            collection = %scope.collection,
            actor = %actor,
            managed = config.is_some(),
            "Collection created"
        );
        Ok(receipt.collection(scope).cloned().unwrap_or(collection))
    }

    /// Delete a collection. Groups, preview and destination are kept.
    pub async fn delete_collection(
        &self,
        scope: &CollectionRef,
        actor: &ActorId,
        expected_last_modified: Option<Timestamp>,
    ) -> SignoffResult<()> {
        let source = self.get_collection(scope).await?;
        check_expected(&source, expected_last_modified)?;

        let mut staged = Staged::new(Utc::now());
        staged.batch.deletes.push(CollectionDelete {
            reference: scope.clone(),
            precondition: Precondition::Version(source.last_modified),
        });
        staged.history.collection(HistoryAction::Delete, &source, actor);
        self.storage.commit(staged.into_batch()).await?;

        tracing::info!(
            bucket = %scope.bucket,
            collection = %scope.collection,
            actor = %actor,
            "Collection deleted"
        );
        Ok(())
    }

    // ── Records ──────────────────────────────────────────────────────

    /// Create, update or delete records of a collection.
    ///
    /// On a managed source any effective change sets `last_edit_by/date`
    /// and moves the status back to `work-in-progress`, dropping a pending
    /// review request. Deleting an unknown id is a no-op.
    pub async fn apply_record_changes(
        &self,
        scope: &CollectionRef,
        actor: &ActorId,
        changes: Vec<RecordChange>,
        expected_last_modified: Option<Timestamp>,
    ) -> SignoffResult<Collection> {
        let source = self.get_collection(scope).await?;
        check_expected(&source, expected_last_modified)?;
        if changes.is_empty() {
            return Ok(source);
        }

        let timestamp = source.last_modified.next();
        let existing: BTreeSet<String> = self
            .replicator
            .read_all(scope)
            .await?
            .into_iter()
            .map(|r| r.id)
            .collect();

        let mut writes: BTreeMap<String, Record> = BTreeMap::new();
        for change in changes {
            match change {
                RecordChange::Upsert { id, data } => {
                    writes.insert(id.clone(), Record::new(id, data, timestamp));
                }
                RecordChange::Delete { id } => {
                    if existing.contains(&id) {
                        writes.insert(id.clone(), Record::tombstone(id, timestamp));
                    } else if writes.remove(&id).is_none() {
                        tracing::debug!(collection = %scope, record = %id, "Delete of unknown record ignored");
                    }
                }
            }
        }
        if writes.is_empty() {
            return Ok(source);
        }

        let date = Utc::now();
        let mut metadata = source.metadata.clone();
        if self.registry.is_source(scope) {
            let previous = metadata.status();
            if previous == CollectionStatus::ToReview {
                metadata.clear_review_request();
            }
            if previous != CollectionStatus::WorkInProgress {
                tracing::debug!(collection = %scope, from = %previous, "Edit moves collection back to work-in-progress");
            }
            metadata.status = Some(CollectionStatus::WorkInProgress);
            metadata.last_edit_by = Some(actor.clone());
            metadata.last_edit_date = Some(date);
        }

        let mut staged = Staged::new(date);
        for record in writes.values() {
            let action = if record.is_tombstone() {
                HistoryAction::Delete
            } else if existing.contains(&record.id) {
                HistoryAction::Update
            } else {
                HistoryAction::Create
            };
            staged.history.record(action, scope, record, actor);
        }
        let count = writes.len();
        staged.batch.collections.push(CollectionWrite {
            reference: scope.clone(),
            precondition: Precondition::Version(source.last_modified),
            last_modified: timestamp,
            records_timestamp: Some(timestamp),
            metadata: metadata.clone(),
            records: writes.into_values().collect(),
        });

        let receipt = self.storage.commit(staged.into_batch()).await?;
        tracing::debug!(collection = %scope, actor = %actor, records = count, "Records written");

        let updated = Collection {
            reference: scope.clone(),
            last_modified: timestamp,
            records_timestamp: timestamp,
            metadata,
        };
        Ok(receipt.collection(scope).cloned().unwrap_or(updated))
    }

    // ── Status transitions ───────────────────────────────────────────

    /// Request a status change on a managed source collection.
    ///
    /// `requested` is the raw status value; unknown values and pairs outside
    /// the transition table fail with `InvalidTransition`, failed guards with
    /// `Forbidden`. Returns the source collection as committed.
    pub async fn request_status(
        &self,
        scope: &CollectionRef,
        actor: &ActorId,
        requested: &str,
        expected_last_modified: Option<Timestamp>,
    ) -> SignoffResult<Collection> {
        let config = self.registry.resolve(scope)?;
        let source = self.get_collection(scope).await?;
        check_expected(&source, expected_last_modified)?;

        let current = source.status();
        let requested_status: CollectionStatus = requested
            .parse()
            .map_err(|_| SignoffError::invalid_transition(current, requested))?;

        let rule = match transitions::lookup(
            current,
            requested_status,
            config.policy.to_review_enabled,
        ) {
            Some(rule) => rule,
            None => {
                tracing::warn!(
                    collection = %scope,
                    actor = %actor,
                    from = %current,
                    to = %requested_status,
                    "Transition rejected"
                );
                return Err(SignoffError::invalid_transition(
                    current,
                    requested_status.as_str(),
                ));
            }
        };

        let roles = self.roles.resolve(&config.policy).await?;
        let check = check_guard(rule.guard, actor, &roles, &source.metadata, &config.policy);
        if let RoleCheck::Denied(reason) = &check {
            tracing::warn!(
                collection = %scope,
                actor = %actor,
                from = %current,
                to = %requested_status,
                reason = %reason,
                "Transition forbidden"
            );
        }
        check.into_result()?;

        let date = Utc::now();
        let mut step = Step {
            config: &config,
            actor,
            timestamp: source.last_modified.next(),
            date,
            metadata: source.metadata.clone(),
            source_writes: Vec::new(),
            staged: Staged::new(date),
        };

        match rule.effect {
            Effect::RequestReview => self.request_review(&mut step).await?,
            Effect::Sign => self.sign(&mut step).await?,
            Effect::CancelReview => step.metadata.clear_review_request(),
            Effect::Resign => self.resign(&mut step).await?,
            Effect::Rollback => self.rollback(&mut step).await?,
        }

        let resulting = rule.resulting_status(current);
        let Step {
            timestamp,
            mut metadata,
            source_writes,
            mut staged,
            ..
        } = step;
        metadata.status = Some(resulting);

        let records_timestamp = if source_writes.is_empty() {
            source.records_timestamp
        } else {
            timestamp
        };
        let updated = Collection {
            reference: scope.clone(),
            last_modified: timestamp,
            records_timestamp,
            metadata: metadata.clone(),
        };
        staged.batch.collections.push(CollectionWrite {
            reference: scope.clone(),
            precondition: Precondition::Version(source.last_modified),
            last_modified: timestamp,
            records_timestamp: (!source_writes.is_empty()).then_some(timestamp),
            metadata,
            records: source_writes,
        });
        staged
            .history
            .transition(&updated, actor, current, requested_status);

        let receipt = self.storage.commit(staged.into_batch()).await?;
        tracing::info!(
            bucket = %scope.bucket,
            collection = %scope.collection,
            actor = %actor,
            from = %current,
            to = %requested_status,
            status = %resulting,
            "Transition applied"
        );
        Ok(receipt.collection(scope).cloned().unwrap_or(updated))
    }

    /// Copy source to preview, sign the preview, record the review request
    async fn request_review(&self, step: &mut Step<'_>) -> SignoffResult<()> {
        let config = step.config;
        let policy = &config.policy;
        let source_records = self.replicator.read_all(&policy.source).await?;
        let destination = self.load_target(&policy.destination).await?;
        let pending = diff(&source_records, &destination.records);

        if let Some(preview) = &policy.preview {
            let preview = self.load_target(preview).await?;
            stage_signed_target(
                &preview,
                Some(source_records.as_slice()),
                config.signer.as_ref(),
                &mut step.staged,
            )?;
        }

        tracing::debug!(
            collection = %policy.source,
            created = pending.created.len(),
            updated = pending.updated.len(),
            deleted = pending.deleted.len(),
            "Review requested"
        );
        step.metadata.last_review_request_by = Some(step.actor.clone());
        step.metadata.last_review_request_date = Some(step.date);
        step.metadata.review_diff = Some(pending.summary());
        Ok(())
    }

    /// Copy source to destination and sign it; bring the preview along
    async fn sign(&self, step: &mut Step<'_>) -> SignoffResult<()> {
        let config = step.config;
        let policy = &config.policy;
        let signer = config.signer.as_ref();
        let source_records = self.replicator.read_all(&policy.source).await?;

        let destination = self.load_target(&policy.destination).await?;
        let plan = stage_signed_target(
            &destination,
            Some(source_records.as_slice()),
            signer,
            &mut step.staged,
        )?;

        if let Some(preview) = &policy.preview {
            let preview = self.load_target(preview).await?;
            if !preview.exists() || !diff(&source_records, &preview.records).is_empty() {
                stage_signed_target(
                    &preview,
                    Some(source_records.as_slice()),
                    signer,
                    &mut step.staged,
                )?;
            }
        }

        tracing::debug!(
            collection = %policy.source,
            destination = %policy.destination,
            changes = plan.diff.len(),
            "Destination signed"
        );
        let actor = Some(step.actor.clone());
        let date = Some(step.date);
        step.metadata.last_reviewer = actor.clone();
        step.metadata.last_review_date = date;
        step.metadata.last_signature_by = actor;
        step.metadata.last_signature_date = date;
        step.metadata.review_diff = None;
        Ok(())
    }

    /// New signatures over unchanged destination (and preview) records
    async fn resign(&self, step: &mut Step<'_>) -> SignoffResult<()> {
        let config = step.config;
        let policy = &config.policy;
        let signer = config.signer.as_ref();

        let destination = self.load_target(&policy.destination).await?;
        stage_signed_target(&destination, None, signer, &mut step.staged)?;
        if let Some(preview) = &policy.preview {
            let preview = self.load_target(preview).await?;
            stage_signed_target(&preview, None, signer, &mut step.staged)?;
        }

        step.metadata.last_signature_by = Some(step.actor.clone());
        step.metadata.last_signature_date = Some(step.date);
        Ok(())
    }

    /// Restore source and preview to the last signed destination content
    async fn rollback(&self, step: &mut Step<'_>) -> SignoffResult<()> {
        let config = step.config;
        let policy = &config.policy;
        let destination = self.load_target(&policy.destination).await?;
        let source_records = self.replicator.read_all(&policy.source).await?;

        let plan = SyncPlan::new(&destination.records, &source_records, step.timestamp);
        step.staged.history.replication(&policy.source, &plan);

        if let Some(preview) = &policy.preview {
            let preview = self.load_target(preview).await?;
            stage_signed_target(
                &preview,
                Some(destination.records.as_slice()),
                config.signer.as_ref(),
                &mut step.staged,
            )?;
        }

        tracing::debug!(
            collection = %policy.source,
            discarded = plan.diff.len(),
            "Source rolled back"
        );
        step.source_writes = plan.writes;
        step.metadata.clear_review_request();
        Ok(())
    }

    async fn load_target(&self, reference: &CollectionRef) -> SignoffResult<TargetState> {
        let collection = self.storage.get_collection(reference).await?;
        let records = self
            .replicator
            .read_optional(reference, collection.is_some())
            .await?;
        Ok(TargetState {
            reference: reference.clone(),
            collection,
            records,
        })
    }
}

/// Stage a signed write of `target`.
///
/// With `wanted`, the target's records are replaced by `wanted`; without,
/// records stay as they are. Either way the records timestamp moves forward
/// so the new signature always differs from the previous one.
fn stage_signed_target(
    target: &TargetState,
    wanted: Option<&[Record]>,
    signer: &dyn SignerBackend,
    staged: &mut Staged,
) -> SignoffResult<SyncPlan> {
    let timestamp = target.next_timestamp();
    let plan = match wanted {
        Some(wanted) => SyncPlan::new(wanted, &target.records, timestamp),
        None => SyncPlan {
            result: target.records.clone(),
            ..SyncPlan::default()
        },
    };

    let signature = sign_records(signer, &plan.result, timestamp)?;
    let mut metadata = target
        .collection
        .as_ref()
        .map(|c| c.metadata.clone())
        .unwrap_or_default();
    metadata.signature = Some(signature);

    let collection = Collection {
        reference: target.reference.clone(),
        last_modified: timestamp,
        records_timestamp: timestamp,
        metadata: metadata.clone(),
    };
    staged.batch.collections.push(CollectionWrite {
        reference: target.reference.clone(),
        precondition: target.precondition(),
        last_modified: timestamp,
        records_timestamp: Some(timestamp),
        metadata,
        records: plan.writes.clone(),
    });

    staged.history.replication(&target.reference, &plan);
    let action = if target.exists() {
        HistoryAction::Update
    } else {
        HistoryAction::Create
    };
    staged
        .history
        .collection(action, &collection, &ActorId::system());
    Ok(plan)
}

fn check_expected(collection: &Collection, expected: Option<Timestamp>) -> SignoffResult<()> {
    match expected {
        Some(expected) if expected != collection.last_modified => {
            Err(SignoffError::ConflictingUpdate(format!(
                "{} is at {}, request was based on {}",
                collection.reference, collection.last_modified, expected
            )))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ResourceSettings;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use signoff_signer::SignerConfig;
    use signoff_storage::InMemorySignoffStorage;
    use signoff_types::ResourceLocation;

    fn workflow() -> SignoffWorkflow<InMemorySignoffStorage> {
        let mut settings = SignoffSettings::default();
        settings.signers.insert(
            "main".to_string(),
            SignerConfig::Ed25519 {
                private_key: Some(STANDARD.encode([5u8; 32])),
                public_key: None,
                x5u: None,
            },
        );
        settings.resources.push(
            ResourceSettings::new(
                ResourceLocation::bucket("stage"),
                ResourceLocation::bucket("prod"),
            )
            .with_preview(ResourceLocation::bucket("preview")),
        );
        SignoffWorkflow::from_settings(Arc::new(InMemorySignoffStorage::new()), &settings).unwrap()
    }

    #[test]
    fn test_check_expected() {
        let collection = Collection::new(
            CollectionRef::new("stage", "cid"),
            CollectionMetadata::work_in_progress(),
            Timestamp(10),
        );
        assert!(check_expected(&collection, None).is_ok());
        assert!(check_expected(&collection, Some(Timestamp(10))).is_ok());
        assert!(matches!(
            check_expected(&collection, Some(Timestamp(9))),
            Err(SignoffError::ConflictingUpdate(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_status_is_invalid_transition() {
        let workflow = workflow();
        let scope = CollectionRef::new("stage", "cid");
        workflow
            .create_collection(&scope, &ActorId::new("anna"))
            .await
            .unwrap();

        let result = workflow
            .request_status(&scope, &ActorId::new("anna"), "published", None)
            .await;
        match result {
            Err(SignoffError::InvalidTransition { from, to }) => {
                assert_eq!(from, "work-in-progress");
                assert_eq!(to, "published");
            }
            other => panic!("expected invalid transition, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_unmanaged_collection_has_no_workflow() {
        let workflow = workflow();
        let scope = CollectionRef::new("scratch", "notes");
        let created = workflow
            .create_collection(&scope, &ActorId::new("anna"))
            .await
            .unwrap();
        assert!(created.metadata.status.is_none());

        let result = workflow
            .request_status(&scope, &ActorId::new("anna"), "to-review", None)
            .await;
        assert!(matches!(result, Err(SignoffError::NotConfigured { .. })));

        let updated = workflow
            .apply_record_changes(
                &scope,
                &ActorId::new("anna"),
                vec![RecordChange::upsert("a", serde_json::json!({"n": 1}))],
                None,
            )
            .await
            .unwrap();
        assert!(updated.metadata.status.is_none());
        assert!(updated.metadata.last_edit_by.is_none());
    }

    #[tokio::test]
    async fn test_stale_expected_timestamp_conflicts_before_any_work() {
        let workflow = workflow();
        let scope = CollectionRef::new("stage", "cid");
        let created = workflow
            .create_collection(&scope, &ActorId::new("anna"))
            .await
            .unwrap();
        let stale = Timestamp(created.last_modified.as_millis() - 1);

        let result = workflow
            .request_status(&scope, &ActorId::new("anna"), "to-review", Some(stale))
            .await;
        assert!(matches!(result, Err(SignoffError::ConflictingUpdate(_))));
        let preview = workflow
            .get_collection(&CollectionRef::new("preview", "cid"))
            .await
            .unwrap();
        assert!(workflow
            .changes_since(&preview.reference, Timestamp(0))
            .await
            .unwrap()
            .is_empty());
    }
}
