//! Signature schemes for known-user token verification.
//!
//! This crate provides:
//! - The current MD5 token scheme (trailing-32-hex-character URL signature)
//! - Two deprecated legacy schemes kept for verification of outstanding
//!   tokens: a weighted character sum and a PBKDF2-derived HMAC-SHA256 token
//! - Shared-secret generation

pub mod error;
pub mod legacy;
pub mod md5_token;
pub mod secret;

pub use error::{SignerError, SignerResult};
pub use md5_token::{generate_md5_hash, verify_md5_hash, verify_url_signature, SIGNATURE_LEN};
pub use secret::generate_random_secret_key;
