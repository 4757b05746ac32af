//! Signature blobs attached to preview and destination collections

use crate::Timestamp;
use serde::{Deserialize, Serialize};

/// A signature over the canonical serialization of a collection.
///
/// Bound to exactly one records timestamp at signing time. Never mutated;
/// re-signing replaces it wholesale.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Algorithm identity (e.g. `ed25519`)
    pub mode: String,
    /// Signature bytes, base64url encoded
    pub signature: String,
    /// Public key of the signer, base64 encoded
    pub public_key: String,
    /// Stable fingerprint of `public_key`
    pub key_id: String,
    /// Optional reference to the certificate chain of the key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x5u: Option<String>,
    /// Records timestamp the signature was computed over
    pub timestamp: Timestamp,
}
