//! Signer selection from configuration

use crate::{Ed25519Signer, SignerBackend, SignerError, SignerResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Signer backend configuration, tagged by `backend`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum SignerConfig {
    /// Local Ed25519 key
    Ed25519 {
        /// Base64 32-byte secret seed; omit for a verification-only signer
        #[serde(default, skip_serializing_if = "Option::is_none")]
        private_key: Option<String>,
        /// Base64 public key, required when `private_key` is absent
        #[serde(default, skip_serializing_if = "Option::is_none")]
        public_key: Option<String>,
        /// Certificate chain reference attached to signatures
        #[serde(default, skip_serializing_if = "Option::is_none")]
        x5u: Option<String>,
    },
}

impl SignerConfig {
    /// Instantiate the configured backend
    pub fn build(&self) -> SignerResult<Arc<dyn SignerBackend>> {
        match self {
            SignerConfig::Ed25519 {
                private_key,
                public_key,
                x5u,
            } => {
                let mut signer = match (private_key, public_key) {
                    (Some(seed), expected) => {
                        let signer = Ed25519Signer::from_base64_seed(seed)?;
                        if let Some(expected) = expected {
                            if expected.trim() != signer.public_key() {
                                return Err(SignerError::InvalidKey(
                                    "public_key does not match private_key".to_string(),
                                ));
                            }
                        }
                        signer
                    }
                    (None, Some(public)) => Ed25519Signer::verifier(public)?,
                    (None, None) => {
                        return Err(SignerError::InvalidKey(
                            "ed25519 signer needs private_key or public_key".to_string(),
                        ))
                    }
                };
                if let Some(x5u) = x5u {
                    signer = signer.with_x5u(x5u.clone());
                }
                Ok(Arc::new(signer))
            }
        }
    }
}
