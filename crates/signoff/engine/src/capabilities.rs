//! Capability discovery, consumed by clients to adapt their expectations

use crate::registry::{ResourceEntry, WorkflowRegistry};
use serde::Serialize;

/// Deployment-wide workflow flags and the signed resources
#[derive(Clone, Debug, Serialize)]
pub struct Capabilities {
    pub group_check_enabled: bool,
    pub to_review_enabled: bool,
    pub editors_group: String,
    pub reviewers_group: String,
    pub resources: Vec<ResourceEntry>,
}

impl Capabilities {
    pub fn from_registry(registry: &WorkflowRegistry) -> Self {
        Self {
            group_check_enabled: registry.group_check_enabled(),
            to_review_enabled: registry.to_review_enabled(),
            editors_group: registry.editors_group().to_string(),
            reviewers_group: registry.reviewers_group().to_string(),
            resources: registry.resources().into_iter().cloned().collect(),
        }
    }
}
