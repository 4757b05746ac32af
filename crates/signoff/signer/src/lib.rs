//! Canonical serialization and signer backends for signoff collections.
//!
//! A collection signature is computed over a byte string that depends only
//! on the *set* of live records and the records timestamp:
//!
//! ```rust
//! use signoff_signer::{canonical_json, Ed25519Signer, SignerBackend};
//! use signoff_types::{Record, Timestamp};
//!
//! let signer = Ed25519Signer::from_seed([7u8; 32]);
//! let records = vec![Record::tombstone("gone", Timestamp(3))];
//! let payload = canonical_json(&records, Timestamp(42));
//! assert_eq!(payload, br#"{"data":[],"last_modified":"42"}"#.to_vec());
//!
//! let signature = signer.sign(&payload, Timestamp(42)).unwrap();
//! assert!(signer.verify(&payload, &signature).is_ok());
//! ```
//!
//! Backends are pluggable through [`SignerBackend`] and selected from
//! configuration with [`SignerConfig`].

#![deny(unsafe_code)]

mod backend;
mod canonical;
mod config;
mod ed25519;
mod error;

pub use backend::{sign_records, verify_records, SignerBackend};
pub use canonical::{canonical_json, canonical_value, SIGNATURE_PREFIX};
pub use config::SignerConfig;
pub use ed25519::{Ed25519Signer, ED25519_MODE};
pub use error::{SignerError, SignerResult};
