//! Signer error types.

use thiserror::Error;

/// Signing operation errors.
#[derive(Debug, Error)]
pub enum SignerError {
    #[error("missing input: {0}")]
    MissingInput(String),

    #[error("invalid signature format: {0}")]
    InvalidSignature(String),

    #[error("verification failed")]
    VerificationFailed,

    #[error("signing error: {0}")]
    Signing(String),
}

/// Result type for signing operations.
pub type SignerResult<T> = std::result::Result<T, SignerError>;
