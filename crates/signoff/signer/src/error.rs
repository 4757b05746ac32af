use signoff_types::SignoffError;
use thiserror::Error;

/// Result type for signer operations.
pub type SignerResult<T> = Result<T, SignerError>;

/// Signer backend errors.
#[derive(Debug, Error)]
pub enum SignerError {
    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("signer has no private key (verification only)")]
    MissingPrivateKey,

    #[error("unsupported signature mode: {0}")]
    UnsupportedMode(String),

    #[error("malformed signature: {0}")]
    Malformed(String),

    #[error("signature does not match payload: {0}")]
    Mismatch(String),
}

impl SignerError {
    /// Whether the error comes from checking a signature rather than producing one
    pub fn is_verification(&self) -> bool {
        matches!(
            self,
            SignerError::UnsupportedMode(_) | SignerError::Malformed(_) | SignerError::Mismatch(_)
        )
    }
}

impl From<SignerError> for SignoffError {
    fn from(err: SignerError) -> Self {
        if err.is_verification() {
            SignoffError::VerificationFailed(err.to_string())
        } else {
            SignoffError::SigningFailed(err.to_string())
        }
    }
}
