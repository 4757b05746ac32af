//! Workflow registry: maps collections to their signoff policy
//!
//! Built once from [`SignoffSettings`] and immutable afterwards. Lookups are
//! pure: per-collection resources take precedence over per-bucket ones.

use crate::settings::{ResourceSettings, SignoffSettings};
use serde::Serialize;
use signoff_signer::SignerBackend;
use signoff_types::{
    expand_group_template, BucketId, CollectionRef, ResourceLocation, ScopePolicy, SignoffError,
    SignoffResult,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Resolved configuration for one source collection
#[derive(Clone, Debug)]
pub struct WorkflowConfig {
    pub policy: ScopePolicy,
    pub signer: Arc<dyn SignerBackend>,
}

/// A validated resource entry
#[derive(Clone, Debug, Serialize)]
pub struct ResourceEntry {
    pub source: ResourceLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<ResourceLocation>,
    pub destination: ResourceLocation,
    pub signer: String,
    pub group_check_enabled: bool,
    pub to_review_enabled: bool,
    pub editors_group: String,
    pub reviewers_group: String,
}

impl ResourceEntry {
    fn policy_for(&self, source: &CollectionRef) -> ScopePolicy {
        ScopePolicy {
            source: source.clone(),
            preview: self
                .preview
                .as_ref()
                .map(|p| p.resolve(&source.collection)),
            destination: self.destination.resolve(&source.collection),
            signer: self.signer.clone(),
            group_check_enabled: self.group_check_enabled,
            to_review_enabled: self.to_review_enabled,
            editors_group: expand_group_template(&self.editors_group, source),
            reviewers_group: expand_group_template(&self.reviewers_group, source),
        }
    }

    fn targets(&self) -> impl Iterator<Item = &ResourceLocation> {
        std::iter::once(&self.destination).chain(self.preview.as_ref())
    }

    /// Source collection whose preview or destination is `target`, if any
    fn source_of(&self, target: &CollectionRef) -> Option<CollectionRef> {
        let matches = |location: &ResourceLocation| {
            location.bucket == target.bucket
                && location
                    .collection
                    .as_ref()
                    .map_or(true, |c| c == &target.collection)
        };
        let is_target = matches(&self.destination) || self.preview.as_ref().map_or(false, matches);
        if !is_target {
            return None;
        }
        Some(self.source.resolve(&target.collection))
    }
}

/// Registry of signoff resources
#[derive(Clone, Debug)]
pub struct WorkflowRegistry {
    per_collection: HashMap<CollectionRef, ResourceEntry>,
    per_bucket: HashMap<BucketId, ResourceEntry>,
    signers: HashMap<String, Arc<dyn SignerBackend>>,
    group_check_enabled: bool,
    to_review_enabled: bool,
    editors_group: String,
    reviewers_group: String,
    replication_chunk_size: usize,
}

impl WorkflowRegistry {
    /// Validate the settings and build the registry.
    ///
    /// Fails with `SignoffError::Configuration` on unknown signers, on
    /// resources whose source, preview and destination overlap, and on
    /// previews or destinations shared between resources.
    pub fn from_settings(settings: &SignoffSettings) -> SignoffResult<Self> {
        if settings.replication_chunk_size == 0 {
            return Err(SignoffError::Configuration(
                "replication_chunk_size must be positive".to_string(),
            ));
        }

        let mut signers = HashMap::new();
        for (name, config) in &settings.signers {
            let backend = config.build().map_err(|e| {
                SignoffError::Configuration(format!("signer '{}': {}", name, e))
            })?;
            signers.insert(name.clone(), backend);
        }

        let mut registry = Self {
            per_collection: HashMap::new(),
            per_bucket: HashMap::new(),
            signers,
            group_check_enabled: settings.group_check_enabled,
            to_review_enabled: settings.to_review_enabled,
            editors_group: settings.editors_group.clone(),
            reviewers_group: settings.reviewers_group.clone(),
            replication_chunk_size: settings.replication_chunk_size,
        };

        for resource in &settings.resources {
            let entry = registry.validate_resource(resource, settings)?;
            for existing in registry.per_collection.values().chain(registry.per_bucket.values()) {
                check_disjoint(&entry, existing)?;
            }

            match &entry.source.collection {
                Some(collection) => {
                    let key = CollectionRef {
                        bucket: entry.source.bucket.clone(),
                        collection: collection.clone(),
                    };
                    if registry.per_collection.insert(key, entry.clone()).is_some() {
                        return Err(SignoffError::Configuration(format!(
                            "{} is configured twice",
                            describe(&entry.source)
                        )));
                    }
                }
                None => {
                    let key = entry.source.bucket.clone();
                    if registry.per_bucket.insert(key, entry.clone()).is_some() {
                        return Err(SignoffError::Configuration(format!(
                            "{} is configured twice",
                            describe(&entry.source)
                        )));
                    }
                }
            }
        }

        tracing::info!(
            per_collection = registry.per_collection.len(),
            per_bucket = registry.per_bucket.len(),
            "Signoff registry loaded"
        );
        Ok(registry)
    }

    fn validate_resource(
        &self,
        resource: &ResourceSettings,
        settings: &SignoffSettings,
    ) -> SignoffResult<ResourceEntry> {
        let source = &resource.source;
        let per_bucket = source.is_per_bucket();

        let mut locations = vec![&resource.destination];
        locations.extend(resource.preview.as_ref());
        for location in &locations {
            if location.is_per_bucket() != per_bucket {
                return Err(SignoffError::Configuration(format!(
                    "{} and {} mix per-bucket and per-collection locations",
                    describe(source),
                    describe(location)
                )));
            }
            if *location == source {
                return Err(SignoffError::Configuration(format!(
                    "{} cannot be signed into itself",
                    describe(source)
                )));
            }
        }
        if resource.preview.as_ref() == Some(&resource.destination) {
            return Err(SignoffError::Configuration(format!(
                "preview and destination of {} are both {}",
                describe(source),
                describe(&resource.destination)
            )));
        }

        let signer = match (&resource.signer, &settings.default_signer) {
            (Some(name), _) | (None, Some(name)) => name.clone(),
            (None, None) if settings.signers.len() == 1 => {
                settings.signers.keys().next().cloned().unwrap_or_default()
            }
            (None, None) => {
                return Err(SignoffError::Configuration(format!(
                    "no signer configured for {}",
                    describe(source)
                )))
            }
        };
        if !self.signers.contains_key(&signer) {
            return Err(SignoffError::Configuration(format!(
                "unknown signer '{}' for {}",
                signer,
                describe(source)
            )));
        }

        Ok(ResourceEntry {
            source: source.clone(),
            preview: resource.preview.clone(),
            destination: resource.destination.clone(),
            signer,
            group_check_enabled: resource
                .group_check_enabled
                .unwrap_or(self.group_check_enabled),
            to_review_enabled: resource.to_review_enabled.unwrap_or(self.to_review_enabled),
            editors_group: resource
                .editors_group
                .clone()
                .unwrap_or_else(|| self.editors_group.clone()),
            reviewers_group: resource
                .reviewers_group
                .clone()
                .unwrap_or_else(|| self.reviewers_group.clone()),
        })
    }

    /// Policy and signer for a source collection
    pub fn resolve(&self, source: &CollectionRef) -> SignoffResult<WorkflowConfig> {
        let entry = self
            .per_collection
            .get(source)
            .or_else(|| self.per_bucket.get(&source.bucket))
            .ok_or_else(|| SignoffError::not_configured(source))?;
        self.config_for(entry, source)
    }

    /// Whether `source` is a managed source collection
    pub fn is_source(&self, source: &CollectionRef) -> bool {
        self.per_collection.contains_key(source) || self.per_bucket.contains_key(&source.bucket)
    }

    /// Configuration of the source that signs into `target` (a preview or
    /// destination collection)
    pub fn resolve_target(&self, target: &CollectionRef) -> SignoffResult<WorkflowConfig> {
        let found = self
            .per_collection
            .values()
            .chain(self.per_bucket.values())
            .find_map(|entry| entry.source_of(target).map(|source| (entry, source)));
        match found {
            Some((entry, source)) => self.config_for(entry, &source),
            None => Err(SignoffError::not_configured(target)),
        }
    }

    fn config_for(
        &self,
        entry: &ResourceEntry,
        source: &CollectionRef,
    ) -> SignoffResult<WorkflowConfig> {
        let signer = self.signers.get(&entry.signer).cloned().ok_or_else(|| {
            SignoffError::Configuration(format!("unknown signer '{}'", entry.signer))
        })?;
        Ok(WorkflowConfig {
            policy: entry.policy_for(source),
            signer,
        })
    }

    /// All resources, per-collection ones first, each group sorted by source
    pub fn resources(&self) -> Vec<&ResourceEntry> {
        let mut per_collection: Vec<_> = self.per_collection.values().collect();
        per_collection.sort_by(|a, b| describe(&a.source).cmp(&describe(&b.source)));
        let mut per_bucket: Vec<_> = self.per_bucket.values().collect();
        per_bucket.sort_by(|a, b| a.source.bucket.cmp(&b.source.bucket));
        per_collection.extend(per_bucket);
        per_collection
    }

    pub fn group_check_enabled(&self) -> bool {
        self.group_check_enabled
    }

    pub fn to_review_enabled(&self) -> bool {
        self.to_review_enabled
    }

    pub fn editors_group(&self) -> &str {
        &self.editors_group
    }

    pub fn reviewers_group(&self) -> &str {
        &self.reviewers_group
    }

    pub fn replication_chunk_size(&self) -> usize {
        self.replication_chunk_size
    }
}

/// Whether two locations can resolve to the same collection. A per-bucket
/// location covers every collection of its bucket.
fn overlaps(a: &ResourceLocation, b: &ResourceLocation) -> bool {
    a.bucket == b.bucket
        && match (&a.collection, &b.collection) {
            (Some(x), Some(y)) => x == y,
            _ => true,
        }
}

/// Reject `entry` if it signs into a collection owned by `existing`, or if
/// `existing` signs into its source.
fn check_disjoint(entry: &ResourceEntry, existing: &ResourceEntry) -> SignoffResult<()> {
    for target in entry.targets() {
        if let Some(other) = existing.targets().find(|other| overlaps(target, other)) {
            return Err(SignoffError::Configuration(format!(
                "{} and {} are the preview or destination of more than one resource",
                describe(target),
                describe(other)
            )));
        }
        if overlaps(target, &existing.source) {
            return Err(SignoffError::Configuration(format!(
                "{} would sign into {}, the source of another resource",
                describe(&entry.source),
                describe(&existing.source)
            )));
        }
    }
    if let Some(other) = existing.targets().find(|other| overlaps(&entry.source, other)) {
        return Err(SignoffError::Configuration(format!(
            "{} is the source of one resource and signed into by another as {}",
            describe(&entry.source),
            describe(other)
        )));
    }
    Ok(())
}

fn describe(location: &ResourceLocation) -> String {
    match &location.collection {
        Some(collection) => format!("{}/{}", location.bucket, collection),
        None => format!("{}/*", location.bucket),
    }
}
