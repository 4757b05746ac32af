//! Local Ed25519 signer backend.

use crate::canonical::SIGNATURE_PREFIX;
use crate::{SignerBackend, SignerError, SignerResult};
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use ed25519_dalek::{Signer as _, SigningKey, VerifyingKey};
use signoff_types::{Signature, Timestamp};
use std::fmt;

/// Algorithm identity of signatures produced by [`Ed25519Signer`]
pub const ED25519_MODE: &str = "ed25519";

/// Ed25519 backend holding a local key.
///
/// Built without a private key it can only verify.
pub struct Ed25519Signer {
    signing_key: Option<SigningKey>,
    verifying_key: VerifyingKey,
    key_id: String,
    x5u: Option<String>,
}

impl Ed25519Signer {
    /// Signer from a 32-byte secret seed
    pub fn from_seed(seed: [u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(&seed);
        let verifying_key = signing_key.verifying_key();
        Self {
            key_id: fingerprint(&verifying_key),
            signing_key: Some(signing_key),
            verifying_key,
            x5u: None,
        }
    }

    /// Signer from a base64-encoded 32-byte seed
    pub fn from_base64_seed(encoded: &str) -> SignerResult<Self> {
        let bytes = decode_key(encoded)?;
        Ok(Self::from_seed(bytes))
    }

    /// Verification-only backend from a base64-encoded public key
    pub fn verifier(public_key: &str) -> SignerResult<Self> {
        let bytes = decode_key(public_key)?;
        let verifying_key = VerifyingKey::from_bytes(&bytes)
            .map_err(|e| SignerError::InvalidKey(e.to_string()))?;
        Ok(Self {
            key_id: fingerprint(&verifying_key),
            signing_key: None,
            verifying_key,
            x5u: None,
        })
    }

    /// Attach a certificate chain reference to produced signatures
    pub fn with_x5u(mut self, x5u: impl Into<String>) -> Self {
        self.x5u = Some(x5u.into());
        self
    }

    /// Base64-encoded public key
    pub fn public_key(&self) -> String {
        STANDARD.encode(self.verifying_key.as_bytes())
    }

    /// Whether this backend can produce signatures
    pub fn can_sign(&self) -> bool {
        self.signing_key.is_some()
    }
}

impl SignerBackend for Ed25519Signer {
    fn mode(&self) -> &str {
        ED25519_MODE
    }

    fn key_id(&self) -> &str {
        &self.key_id
    }

    fn sign(&self, payload: &[u8], timestamp: Timestamp) -> SignerResult<Signature> {
        let signing_key = self
            .signing_key
            .as_ref()
            .ok_or(SignerError::MissingPrivateKey)?;

        let signature = signing_key.sign(&prefixed(payload));
        tracing::debug!(key_id = %self.key_id, %timestamp, "Payload signed");

        Ok(Signature {
            mode: ED25519_MODE.to_string(),
            signature: URL_SAFE_NO_PAD.encode(signature.to_bytes()),
            public_key: self.public_key(),
            key_id: self.key_id.clone(),
            x5u: self.x5u.clone(),
            timestamp,
        })
    }

    fn verify(&self, payload: &[u8], signature: &Signature) -> SignerResult<()> {
        if signature.mode != ED25519_MODE {
            return Err(SignerError::UnsupportedMode(signature.mode.clone()));
        }
        if signature.key_id != self.key_id {
            return Err(SignerError::Mismatch(format!(
                "signed by key {}, expected key {}",
                signature.key_id, self.key_id
            )));
        }

        let bytes = URL_SAFE_NO_PAD
            .decode(signature.signature.as_bytes())
            .map_err(|e| SignerError::Malformed(e.to_string()))?;
        let parsed = ed25519_dalek::Signature::from_slice(&bytes)
            .map_err(|e| SignerError::Malformed(e.to_string()))?;

        self.verifying_key
            .verify_strict(&prefixed(payload), &parsed)
            .map_err(|e| SignerError::Mismatch(e.to_string()))
    }
}

impl fmt::Debug for Ed25519Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ed25519Signer")
            .field("key_id", &self.key_id)
            .field("can_sign", &self.can_sign())
            .field("x5u", &self.x5u)
            .finish()
    }
}

fn prefixed(payload: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(SIGNATURE_PREFIX.len() + payload.len());
    message.extend_from_slice(SIGNATURE_PREFIX);
    message.extend_from_slice(payload);
    message
}

fn fingerprint(key: &VerifyingKey) -> String {
    let hex = blake3::hash(key.as_bytes()).to_hex();
    hex.as_str()[..16].to_string()
}

fn decode_key(encoded: &str) -> SignerResult<[u8; 32]> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| SignerError::InvalidKey(e.to_string()))?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| SignerError::InvalidKey(format!("expected 32 bytes, got {}", b.len())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{canonical_json, sign_records, verify_records};
    use proptest::prelude::*;
    use signoff_types::Record;

    fn records() -> Vec<Record> {
        (0..3)
            .map(|n| {
                Record::new(
                    format!("r{}", n),
                    serde_json::json!({"n": n}).as_object().cloned().unwrap(),
                    Timestamp(100 + n),
                )
            })
            .collect()
    }

    #[test]
    fn test_sign_then_verify() {
        let signer = Ed25519Signer::from_seed([1u8; 32]);
        let signature = sign_records(&signer, &records(), Timestamp(200)).unwrap();
        assert_eq!(signature.mode, ED25519_MODE);
        assert_eq!(signature.timestamp, Timestamp(200));
        verify_records(&signer, &records(), Timestamp(200), &signature).unwrap();
    }

    #[test]
    fn test_tampered_records_fail() {
        let signer = Ed25519Signer::from_seed([1u8; 32]);
        let signature = sign_records(&signer, &records(), Timestamp(200)).unwrap();
        let mut tampered = records();
        tampered.pop();
        let err = verify_records(&signer, &tampered, Timestamp(200), &signature).unwrap_err();
        assert!(matches!(err, SignerError::Mismatch(_)));
    }

    #[test]
    fn test_other_key_rejects_signature() {
        let alice = Ed25519Signer::from_seed([1u8; 32]);
        let bob = Ed25519Signer::from_seed([2u8; 32]);
        let payload = canonical_json(&records(), Timestamp(5));
        let signature = alice.sign(&payload, Timestamp(5)).unwrap();
        assert!(bob.verify(&payload, &signature).is_err());

        // Relabelling the key id does not help either.
        let mut forged = signature.clone();
        forged.key_id = bob.key_id().to_string();
        assert!(matches!(
            bob.verify(&payload, &forged),
            Err(SignerError::Mismatch(_))
        ));
    }

    #[test]
    fn test_verifier_cannot_sign() {
        let signer = Ed25519Signer::from_seed([3u8; 32]);
        let verifier = Ed25519Signer::verifier(&signer.public_key()).unwrap();
        assert_eq!(verifier.key_id(), signer.key_id());
        assert!(!verifier.can_sign());

        let payload = canonical_json(&records(), Timestamp(9));
        let signature = signer.sign(&payload, Timestamp(9)).unwrap();
        verifier.verify(&payload, &signature).unwrap();
        assert!(matches!(
            verifier.sign(&payload, Timestamp(9)),
            Err(SignerError::MissingPrivateKey)
        ));
    }

    #[test]
    fn test_unsupported_mode() {
        let signer = Ed25519Signer::from_seed([4u8; 32]);
        let payload = canonical_json(&[], Timestamp(1));
        let mut signature = signer.sign(&payload, Timestamp(1)).unwrap();
        signature.mode = "p384ecdsa".to_string();
        assert!(matches!(
            signer.verify(&payload, &signature),
            Err(SignerError::UnsupportedMode(_))
        ));
    }

    #[test]
    fn test_invalid_seed_length() {
        let result = Ed25519Signer::from_base64_seed(&STANDARD.encode([0u8; 16]));
        assert!(matches!(result, Err(SignerError::InvalidKey(_))));
    }

    #[test]
    fn test_x5u_is_attached() {
        let signer = Ed25519Signer::from_seed([5u8; 32]).with_x5u("https://keys.example/chain.pem");
        let signature = signer.sign(b"{}", Timestamp(1)).unwrap();
        assert_eq!(
            signature.x5u.as_deref(),
            Some("https://keys.example/chain.pem")
        );
    }

    proptest! {
        #[test]
        fn property_sign_verify_matching_key(seed in any::<[u8; 32]>(), other in any::<[u8; 32]>(), ts in 0u64..1_000_000) {
            let signer = Ed25519Signer::from_seed(seed);
            let signature = sign_records(&signer, &records(), Timestamp(ts)).unwrap();
            prop_assert!(verify_records(&signer, &records(), Timestamp(ts), &signature).is_ok());

            prop_assume!(seed != other);
            let stranger = Ed25519Signer::from_seed(other);
            prop_assert!(verify_records(&stranger, &records(), Timestamp(ts), &signature).is_err());
        }
    }
}
