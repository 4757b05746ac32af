//! Error types for the signoff workflow

use crate::{BucketId, CollectionId, CollectionRef, CollectionStatus};

/// Errors surfaced to the caller of a workflow operation.
///
/// Every variant leaves the collections untouched: the workflow stages all
/// writes and commits them in one batch only once every step succeeded.
#[derive(Debug, thiserror::Error)]
pub enum SignoffError {
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("No signoff workflow configured for {bucket}/{collection}")]
    NotConfigured {
        bucket: BucketId,
        collection: CollectionId,
    },

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Signature verification failed: {0}")]
    VerificationFailed(String),

    #[error("Conflicting update: {0}")]
    ConflictingUpdate(String),

    #[error("Collection not found: {0}")]
    CollectionNotFound(CollectionRef),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl SignoffError {
    pub fn invalid_transition(from: CollectionStatus, to: impl Into<String>) -> Self {
        SignoffError::InvalidTransition {
            from: from.to_string(),
            to: to.into(),
        }
    }

    pub fn not_configured(collection: &CollectionRef) -> Self {
        SignoffError::NotConfigured {
            bucket: collection.bucket.clone(),
            collection: collection.collection.clone(),
        }
    }
}

/// Result type alias for signoff operations
pub type SignoffResult<T> = Result<T, SignoffError>;
