//! Validation outcome types.

use crate::token::KnownUserToken;
use url::Url;

/// Outcome of validating one request.
///
/// Closed sum: callers handle exactly these two cases (validation failures
/// are raised as errors, never represented as a result variant).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationResult {
    /// The visitor must be sent to the queue or a landing page.
    Enqueue {
        /// URL to redirect the visitor to.
        redirect_url: Url,
    },
    /// The visitor holds a valid, unexpired pass.
    AcceptedConfirmed {
        /// The verified token.
        token: KnownUserToken,
        /// True only on the request that verified the token; false on every
        /// subsequent cache hit, so hosts can persist their own data once.
        is_initial_validation: bool,
    },
}

impl ValidationResult {
    /// The verified token, when the visitor is accepted.
    pub fn token(&self) -> Option<&KnownUserToken> {
        match self {
            Self::AcceptedConfirmed { token, .. } => Some(token),
            Self::Enqueue { .. } => None,
        }
    }
}
