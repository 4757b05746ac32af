use crate::canonical::canonical_json;
use crate::SignerResult;
use signoff_types::{Record, Signature, Timestamp};
use std::fmt;

/// A keyed signing primitive.
///
/// Each backend instance is bound to exactly one key. Verification uses the
/// backend's own public key, never the key embedded in the signature, so a
/// signature produced under one key never verifies under another.
pub trait SignerBackend: Send + Sync + fmt::Debug {
    /// Algorithm identity written into produced signatures
    fn mode(&self) -> &str;

    /// Fingerprint of the key this backend is bound to
    fn key_id(&self) -> &str;

    /// Sign a canonical payload computed at `timestamp`.
    fn sign(&self, payload: &[u8], timestamp: Timestamp) -> SignerResult<Signature>;

    /// Check `signature` against `payload`.
    fn verify(&self, payload: &[u8], signature: &Signature) -> SignerResult<()>;
}

/// Serialize `records` canonically and sign them
pub fn sign_records(
    backend: &dyn SignerBackend,
    records: &[Record],
    timestamp: Timestamp,
) -> SignerResult<Signature> {
    let payload = canonical_json(records, timestamp);
    backend.sign(&payload, timestamp)
}

/// Re-serialize `records` at `timestamp` and verify `signature` over them
pub fn verify_records(
    backend: &dyn SignerBackend,
    records: &[Record],
    timestamp: Timestamp,
    signature: &Signature,
) -> SignerResult<()> {
    let payload = canonical_json(records, timestamp);
    backend.verify(&payload, signature)
}
