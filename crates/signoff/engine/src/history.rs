//! Builds history entries for one workflow step
//!
//! The recorder only accumulates [`HistoryAppend`] payloads; they are
//! committed in the same batch as the writes they describe, and storage
//! assigns sequence numbers and hashes.

use crate::replication::SyncPlan;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::collections::BTreeSet;
use signoff_storage::Group;
use signoff_types::{
    ActorId, Collection, CollectionRef, CollectionStatus, HistoryAction, HistoryAppend, Record,
    ResourceKind, Timestamp,
};

pub struct HistoryRecorder {
    date: DateTime<Utc>,
    entries: Vec<HistoryAppend>,
}

impl HistoryRecorder {
    pub fn new(date: DateTime<Utc>) -> Self {
        Self {
            date,
            entries: Vec::new(),
        }
    }

    pub fn collection(
        &mut self,
        action: HistoryAction,
        collection: &Collection,
        actor: &ActorId,
    ) {
        self.entries.push(HistoryAppend {
            action,
            resource_kind: ResourceKind::Collection,
            resource: collection.reference.uri(),
            actor: actor.clone(),
            timestamp: collection.last_modified,
            date: self.date,
            collection: collection.reference.clone(),
            record_id: None,
            target: serde_json::to_value(collection).unwrap_or(Value::Null),
        });
    }

    pub fn record(
        &mut self,
        action: HistoryAction,
        reference: &CollectionRef,
        record: &Record,
        actor: &ActorId,
    ) {
        self.entries.push(HistoryAppend {
            action,
            resource_kind: ResourceKind::Record,
            resource: reference.record_uri(&record.id),
            actor: actor.clone(),
            timestamp: record.last_modified,
            date: self.date,
            collection: reference.clone(),
            record_id: Some(record.id.clone()),
            target: record.to_value(),
        });
    }

    /// Record writes of a replication plan, attributed to the workflow itself
    pub fn replication(&mut self, target: &CollectionRef, plan: &SyncPlan) {
        let system = ActorId::system();
        let created: BTreeSet<&str> = plan.diff.created.iter().map(|r| r.id.as_str()).collect();
        for write in &plan.writes {
            let action = if write.is_tombstone() {
                HistoryAction::Delete
            } else if created.contains(write.id.as_str()) {
                HistoryAction::Create
            } else {
                HistoryAction::Update
            };
            self.record(action, target, write, &system);
        }
    }

    /// Group provisioned on behalf of `source`
    pub fn group(&mut self, source: &CollectionRef, group: &Group, timestamp: Timestamp) {
        self.entries.push(HistoryAppend {
            action: HistoryAction::Create,
            resource_kind: ResourceKind::Group,
            resource: format!("/buckets/{}/groups/{}", group.bucket, group.name),
            actor: ActorId::system(),
            timestamp,
            date: self.date,
            collection: source.clone(),
            record_id: None,
            target: json!({ "id": group.name, "members": group.members }),
        });
    }

    /// A completed status transition, attributed to the requesting actor
    pub fn transition(
        &mut self,
        source: &Collection,
        actor: &ActorId,
        from: CollectionStatus,
        requested: CollectionStatus,
    ) {
        self.entries.push(HistoryAppend {
            action: HistoryAction::Transition,
            resource_kind: ResourceKind::Collection,
            resource: source.reference.uri(),
            actor: actor.clone(),
            timestamp: source.last_modified,
            date: self.date,
            collection: source.reference.clone(),
            record_id: None,
            target: json!({
                "from": from,
                "requested": requested,
                "status": source.status(),
                "metadata": source.metadata,
            }),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<HistoryAppend> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replication::SyncPlan;
    use signoff_types::CollectionMetadata;

    #[test]
    fn test_replication_entries_are_system_writes() {
        let current = vec![
            Record::new("gone", Default::default(), Timestamp(1)),
            Record::new(
                "kept",
                json!({"v": 1}).as_object().cloned().unwrap(),
                Timestamp(1),
            ),
        ];
        let wanted = vec![
            Record::new("new", Default::default(), Timestamp(2)),
            Record::new(
                "kept",
                json!({"v": 2}).as_object().cloned().unwrap(),
                Timestamp(2),
            ),
        ];
        let plan = SyncPlan::new(&wanted, &current, Timestamp(3));
        let target = CollectionRef::new("prod", "cid");

        let mut recorder = HistoryRecorder::new(Utc::now());
        recorder.replication(&target, &plan);
        let entries = recorder.into_entries();

        assert_eq!(entries.len(), 3);
        assert!(entries.iter().all(|e| e.actor == ActorId::system()));
        let actions: Vec<_> = entries
            .iter()
            .map(|e| (e.record_id.clone().unwrap(), e.action))
            .collect();
        assert!(actions.contains(&("new".to_string(), HistoryAction::Create)));
        assert!(actions.contains(&("kept".to_string(), HistoryAction::Update)));
        assert!(actions.contains(&("gone".to_string(), HistoryAction::Delete)));
        assert_eq!(
            entries[0].resource,
            format!("/buckets/prod/collections/cid/records/{}", entries[0].record_id.as_deref().unwrap())
        );
    }

    #[test]
    fn test_replication_of_large_record_sets() {
        let current: Vec<Record> = (0..10_000)
            .map(|i| Record::new(format!("old-{:05}", i), Default::default(), Timestamp(1)))
            .collect();
        let wanted: Vec<Record> = (0..20_000)
            .map(|i| Record::new(format!("new-{:05}", i), Default::default(), Timestamp(2)))
            .chain(current.iter().take(5_000).cloned())
            .collect();
        let plan = SyncPlan::new(&wanted, &current, Timestamp(3));

        let mut recorder = HistoryRecorder::new(Utc::now());
        recorder.replication(&CollectionRef::new("prod", "cid"), &plan);
        let entries = recorder.into_entries();

        let count = |action: HistoryAction| entries.iter().filter(|e| e.action == action).count();
        assert_eq!(count(HistoryAction::Create), 20_000);
        assert_eq!(count(HistoryAction::Delete), 5_000);
        assert_eq!(count(HistoryAction::Update), 0);
    }

    #[test]
    fn test_transition_entry_carries_actor_and_statuses() {
        let mut collection = Collection::new(
            CollectionRef::new("stage", "cid"),
            CollectionMetadata::work_in_progress(),
            Timestamp(5),
        );
        collection.metadata.status = Some(CollectionStatus::ToReview);

        let mut recorder = HistoryRecorder::new(Utc::now());
        recorder.transition(
            &collection,
            &ActorId::new("anna"),
            CollectionStatus::WorkInProgress,
            CollectionStatus::ToReview,
        );
        let entry = &recorder.into_entries()[0];

        assert_eq!(entry.action, HistoryAction::Transition);
        assert_eq!(entry.actor, ActorId::new("anna"));
        assert_eq!(entry.timestamp, Timestamp(5));
        assert_eq!(entry.target["from"], json!("work-in-progress"));
        assert_eq!(entry.target["status"], json!("to-review"));
    }
}
