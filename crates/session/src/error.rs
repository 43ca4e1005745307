//! Controller-level error types.

use thiserror::Error;
use turnstile_core::{Channel, KnownUserToken};
use turnstile_knownuser::KnownUserError;

/// Errors raised by the validation controller.
///
/// Both variants carry the channel so a host serving several queues can
/// route the visitor back to the right one.
#[derive(Debug, Error)]
pub enum SessionValidationError {
    /// The token is well formed but older than the configured ticket
    /// lifetime.
    #[error("known-user token for {channel} is expired")]
    Expired {
        /// The queue the request was validated against.
        channel: Channel,
        /// The expired token.
        token: Box<KnownUserToken>,
    },

    /// The token parameters or signature are invalid.
    #[error("known-user request for {channel} is invalid")]
    Invalid {
        /// The queue the request was validated against.
        channel: Channel,
        /// The underlying parser error.
        #[source]
        source: KnownUserError,
    },
}

impl SessionValidationError {
    /// The queue the failed request belongs to.
    pub fn channel(&self) -> &Channel {
        match self {
            Self::Expired { channel, .. } | Self::Invalid { channel, .. } => channel,
        }
    }
}

/// Result type for controller operations.
pub type SessionValidationResult<T> = std::result::Result<T, SessionValidationError>;
