//! The current token signature scheme.
//!
//! The remote queue service appends the hex-encoded MD5 of
//! `url_without_hash + secret` as the final 32 characters of the redirect
//! URL. Verification trims those 32 characters, recomputes, and compares
//! case-insensitively.

use crate::error::{SignerError, SignerResult};
use md5::{Digest, Md5};
use turnstile_core::codec;

/// Length of the hex-encoded signature at the end of a signed URL.
pub const SIGNATURE_LEN: usize = 32;

/// Sentinel returned by [`verify_md5_hash`] when required input is missing
/// or malformed.
pub const MISSING_INPUT: i64 = -2;

/// Sentinel returned by [`verify_md5_hash`] when the signature does not
/// match.
pub const HASH_MISMATCH: i64 = -1;

/// Generate the MD5 token hash of a URL using the shared secret.
pub fn generate_md5_hash(url: &str, secret_key: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(url.as_bytes());
    hasher.update(secret_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Verify the trailing signature of a full signed URL.
///
/// The last [`SIGNATURE_LEN`] characters of `url` are the signature; the
/// MD5 of the rest plus the secret must match them, case-insensitively.
pub fn verify_url_signature(url: &str, secret_key: &str) -> SignerResult<()> {
    // Split off the final 32 characters. Signed URLs are percent-encoded
    // ASCII, but count characters rather than bytes to stay panic-free on
    // arbitrary input.
    let split = url
        .char_indices()
        .rev()
        .nth(SIGNATURE_LEN - 1)
        .map(|(index, _)| index)
        .filter(|&index| index > 0)
        .ok_or_else(|| {
            SignerError::InvalidSignature(format!(
                "url shorter than {SIGNATURE_LEN}-character signature"
            ))
        })?;

    let (payload, signature) = url.split_at(split);
    let expected = generate_md5_hash(payload, secret_key);

    if expected.eq_ignore_ascii_case(signature) {
        Ok(())
    } else {
        Err(SignerError::VerificationFailed)
    }
}

/// Sentinel-style verification retained for wire compatibility.
///
/// Returns [`MISSING_INPUT`] when any input is empty or the obfuscated place
/// is malformed, [`HASH_MISMATCH`] when the signature does not match, and
/// the decoded place in queue on success. A decoded place of
/// [`codec::MAX_PLACE`] means "queue disabled" and is passed through
/// untouched; it is never a hash failure.
pub fn verify_md5_hash(url: &str, secret_key: &str, place_in_queue_obfuscated: &str) -> i64 {
    if url.is_empty() || secret_key.is_empty() || place_in_queue_obfuscated.is_empty() {
        return MISSING_INPUT;
    }

    match verify_url_signature(url, secret_key) {
        Ok(()) => match codec::decode(place_in_queue_obfuscated) {
            Ok(place) => i64::from(place),
            Err(_) => MISSING_INPUT,
        },
        Err(SignerError::VerificationFailed) => HASH_MISMATCH,
        Err(_) => MISSING_INPUT,
    }
}
