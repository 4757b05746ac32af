//! Signoff storage abstractions.
//!
//! This crate defines the contract the workflow expects from its storage
//! collaborator:
//! - versioned record collections with compare-and-swap batch commits
//! - bucket groups used to resolve editors and reviewers
//! - an append-only, hash-linked history feed
//!
//! Permission enforcement happens before the workflow is reached and is not
//! part of this contract.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod error;
pub mod memory;
mod model;
mod traits;

pub use error::{StorageError, StorageResult};
pub use memory::InMemorySignoffStorage;
pub use model::{
    CollectionDelete, CollectionWrite, CommitReceipt, Group, GroupEnsure, Precondition, WriteBatch,
};
pub use traits::{CollectionStore, GroupStore, HistoryStore, QueryWindow, SignoffStorage};
