//! Review-and-signoff workflow engine
//!
//! Changes accumulate in a source collection, go through an editor/reviewer
//! cycle, and are then signed and replicated to a destination collection.
//! An optional preview collection is signed on every review request.
//!
//! # Architecture
//!
//! The [`SignoffWorkflow`] composes specialized components:
//!
//! - [`WorkflowRegistry`]: maps collections to their policy and signer
//! - [`transitions`]: the status transition table (guard plus effect)
//! - [`RoleResolver`] and the predicates in [`roles`]: editor/reviewer guards
//! - [`Replicator`] and [`SyncPlan`]: paged reads and staged record sync
//! - [`HistoryRecorder`]: audit entries committed with the writes
//!
//! Every operation stages its writes and commits them in a single
//! compare-and-swap batch, so a failed guard, signer or precondition
//! leaves no partial state behind.
//!
//! # Example
//!
//! ```rust
//! use signoff_engine::transitions::{lookup, Effect};
//! use signoff_types::CollectionStatus;
//!
//! let rule = lookup(CollectionStatus::ToReview, CollectionStatus::ToSign, true).unwrap();
//! assert_eq!(rule.effect, Effect::Sign);
//! assert_eq!(
//!     rule.resulting_status(CollectionStatus::ToReview),
//!     CollectionStatus::Signed
//! );
//!
//! // Signing without a review is only possible when reviews are disabled.
//! assert!(lookup(CollectionStatus::WorkInProgress, CollectionStatus::ToSign, true).is_none());
//! assert!(lookup(CollectionStatus::WorkInProgress, CollectionStatus::ToSign, false).is_some());
//! ```

#![deny(unsafe_code)]

pub mod capabilities;
pub mod history;
pub mod registry;
pub mod replication;
pub mod roles;
pub mod settings;
pub mod transitions;
pub mod workflow;

// Re-export main types
pub use capabilities::Capabilities;
pub use history::HistoryRecorder;
pub use registry::{ResourceEntry, WorkflowConfig, WorkflowRegistry};
pub use replication::{diff, RecordDiff, Replicator, SyncPlan};
pub use roles::{ResolvedRoles, RoleCheck, RoleResolver};
pub use settings::{init_tracing, LoggingConfig, ResourceSettings, SignoffSettings};
pub use transitions::{Effect, Guard, TransitionRule};
pub use workflow::SignoffWorkflow;
