//! Signoff Domain Types
//!
//! Data collections in a signoff deployment never reach consumers directly.
//! Changes accumulate in a **source** collection, pass an editor/reviewer
//! cycle, and only then are signed and replicated to a **destination**
//! collection. An optional **preview** collection mirrors the content under
//! review and is signed on every review request.
//!
//! # Key Concepts
//!
//! - **CollectionRef**: `(bucket, collection)` address of a record container.
//! - **Record**: schema-free JSON object with an `id`, a `last_modified`
//!   timestamp and a tombstone marker.
//! - **CollectionStatus**: the review status driving the workflow.
//! - **CollectionMetadata**: the `last_*` attributes owned by the workflow.
//! - **Signature**: an opaque signed blob bound to one records timestamp.
//! - **ScopePolicy**: resolved workflow configuration for one source.
//! - **HistoryEntry**: append-only audit entry for transitions and record writes.

#![deny(unsafe_code)]

mod collection;
mod errors;
mod history;
mod ids;
mod policy;
mod record;
mod signature;

pub use collection::*;
pub use errors::*;
pub use history::*;
pub use ids::*;
pub use policy::*;
pub use record::*;
pub use signature::*;
