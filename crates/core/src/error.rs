//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid obfuscated place in queue: {0}")]
    CodecFormat(String),

    #[error("invalid channel: {0}")]
    InvalidChannel(String),

    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
