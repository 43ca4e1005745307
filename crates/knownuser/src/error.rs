//! Parser/verifier error types.

use thiserror::Error;
use url::Url;

/// Errors raised while turning an inbound redirect URL into a token.
///
/// Both variants are recoverable by the caller: they carry the original URL
/// (token parameters stripped) so the visitor can be redirected back into
/// the queue.
#[derive(Debug, Error)]
pub enum KnownUserError {
    /// The token parameters are partially present or unparsable.
    #[error("the url of the request is invalid")]
    InvalidUrl {
        /// The inbound URL without token parameters.
        original_url: Url,
    },

    /// The URL signature does not match.
    #[error("the hash of the request is invalid")]
    InvalidHash {
        /// The inbound URL without token parameters.
        original_url: Url,
        /// The full URL the signature was computed over.
        validated_url: Url,
    },
}

impl KnownUserError {
    /// The inbound URL with token parameters stripped.
    pub fn original_url(&self) -> &Url {
        match self {
            Self::InvalidUrl { original_url } | Self::InvalidHash { original_url, .. } => {
                original_url
            }
        }
    }
}

/// Result type for parser operations.
pub type KnownUserResult<T> = std::result::Result<T, KnownUserError>;
