//! Deprecated signature schemes.
//!
//! Retained only so outstanding tokens minted by old integrations keep
//! verifying. New integrations must use the MD5 token scheme in
//! [`crate::md5_token`].
//!
//! Sentinel contract shared by every `verify_*` function here: `-2` when a
//! required input is missing or malformed, `-1` when the check value does
//! not match, otherwise the decoded place in queue. A decoded place of
//! [`codec::MAX_PLACE`] means "queue disabled", not a failure.

use crate::error::{SignerError, SignerResult};
use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2_hmac;
use sha1::Sha1;
use sha2::Sha256;
use turnstile_core::codec;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// PBKDF2 round count fixed by the legacy wire protocol (the .NET
/// `Rfc2898DeriveBytes` default).
const KEY_DERIVATION_ROUNDS: u32 = 1000;

/// Derived HMAC key length in bytes, fixed by the legacy wire protocol.
const DERIVED_KEY_LEN: usize = 64;

/// Missing or malformed input sentinel.
pub const MISSING_INPUT: i64 = -2;

/// Check-value mismatch sentinel.
pub const HASH_MISMATCH: i64 = -1;

fn require(value: &str, name: &str) -> SignerResult<()> {
    if value.is_empty() {
        Err(SignerError::MissingInput(name.to_string()))
    } else {
        Ok(())
    }
}

/// Cyclically self-extend the shared key until it is at least `len` UTF-16
/// units long.
fn extend_shared_key(secret_key: &[u16], len: usize) -> Vec<u16> {
    if secret_key.is_empty() {
        return Vec::new();
    }
    secret_key
        .iter()
        .copied()
        .cycle()
        .take(len.max(secret_key.len()))
        .collect()
}

/// Weighted character sum of `content` against the extended key.
///
/// Each UTF-16 code unit of the content is multiplied by the matching code
/// unit of the key and the products are summed.
fn weighted_sum(content: &str, secret_key: &str) -> i64 {
    let content: Vec<u16> = content.encode_utf16().collect();
    let key = extend_shared_key(&secret_key.encode_utf16().collect::<Vec<_>>(), content.len());

    content
        .iter()
        .zip(&key)
        .map(|(&c, &k)| i64::from(c) * i64::from(k))
        .sum()
}

/// Generate the weighted-sum check value over a queue id and obfuscated
/// place.
#[deprecated(note = "use the MD5 token scheme for new integrations")]
pub fn generate_simple_hash(
    queue_id: &str,
    place_in_queue_obfuscated: &str,
    secret_key: &str,
) -> SignerResult<i64> {
    require(queue_id, "queue_id")?;
    require(place_in_queue_obfuscated, "place_in_queue_obfuscated")?;
    require(secret_key, "secret_key")?;

    let content = format!("{queue_id}{place_in_queue_obfuscated}");
    Ok(weighted_sum(&content, secret_key))
}

/// Verify a weighted-sum check value.
#[deprecated(note = "use the MD5 token scheme for new integrations")]
pub fn verify_simple_hash(
    queue_id: &str,
    place_in_queue_obfuscated: &str,
    secret_key: &str,
    parsed_check_value: i64,
) -> i64 {
    let content = format!("{queue_id}{place_in_queue_obfuscated}");
    verify_weighted_sum(&content, place_in_queue_obfuscated, secret_key, parsed_check_value)
}

/// Generate the weighted-sum check value including an issue timestamp.
#[deprecated(note = "use the MD5 token scheme for new integrations")]
pub fn generate_simple_hash_with_timestamp(
    queue_id: &str,
    place_in_queue_obfuscated: &str,
    timestamp: i64,
    secret_key: &str,
) -> SignerResult<i64> {
    require(queue_id, "queue_id")?;
    require(place_in_queue_obfuscated, "place_in_queue_obfuscated")?;
    require(secret_key, "secret_key")?;

    let content = format!("{queue_id}{place_in_queue_obfuscated}{timestamp}");
    Ok(weighted_sum(&content, secret_key))
}

/// Verify a weighted-sum check value including an issue timestamp.
#[deprecated(note = "use the MD5 token scheme for new integrations")]
pub fn verify_simple_hash_with_timestamp(
    queue_id: &str,
    place_in_queue_obfuscated: &str,
    timestamp: i64,
    secret_key: &str,
    parsed_check_value: i64,
) -> i64 {
    let content = format!("{queue_id}{place_in_queue_obfuscated}{timestamp}");
    verify_weighted_sum(&content, place_in_queue_obfuscated, secret_key, parsed_check_value)
}

fn verify_weighted_sum(
    content: &str,
    place_in_queue_obfuscated: &str,
    secret_key: &str,
    parsed_check_value: i64,
) -> i64 {
    if content.is_empty() || secret_key.is_empty() {
        return MISSING_INPUT;
    }

    let place = match codec::decode(place_in_queue_obfuscated) {
        Ok(place) => i64::from(place),
        Err(_) => return MISSING_INPUT,
    };

    if weighted_sum(content, secret_key) != parsed_check_value {
        return HASH_MISMATCH;
    }

    place
}

/// Percent-encoding as the legacy service rendered it: alphanumerics and
/// `-_.!*()` stay bare, space becomes `+`, everything else is `%xx` with
/// lowercase hex. This differs from standard form-urlencoding in both the
/// bare-character set and the hex case, and the hash comparison is exact,
/// so the standard encoders cannot be substituted here.
fn legacy_url_encode(bytes: &[u8]) -> String {
    let mut encoded = String::with_capacity(bytes.len() * 3);
    for &byte in bytes {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'!' | b'*'
            | b'(' | b')' => encoded.push(char::from(byte)),
            b' ' => encoded.push('+'),
            _ => {
                encoded.push('%');
                encoded.push_str(&format!("{byte:02x}"));
            }
        }
    }
    encoded
}

/// Generate the keyed-HMAC token hash.
///
/// A 64-byte key is derived from the password and queue id with
/// PBKDF2-HMAC-SHA1, the canonical string is HMAC-SHA256'd, rendered
/// ASCII-lossily (non-ASCII digest bytes become `?`, per the legacy wire
/// format) and percent-encoded twice in the service's own encoding.
#[deprecated(note = "use the MD5 token scheme for new integrations")]
pub fn generate_hmac_sha256_hash(
    password: &str,
    queue_id: &str,
    url_to_hash: &str,
) -> SignerResult<String> {
    require(queue_id, "queue_id")?;
    require(password, "password")?;
    require(url_to_hash, "url_to_hash")?;

    let mut derived_key = [0u8; DERIVED_KEY_LEN];
    pbkdf2_hmac::<Sha1>(
        password.as_bytes(),
        queue_id.as_bytes(),
        KEY_DERIVATION_ROUNDS,
        &mut derived_key,
    );

    let mut mac = HmacSha256::new_from_slice(&derived_key)
        .map_err(|e| SignerError::Signing(e.to_string()))?;
    mac.update(url_to_hash.as_bytes());
    let digest = mac.finalize().into_bytes();

    let ascii_lossy: Vec<u8> = digest
        .iter()
        .map(|&byte| if byte > 0x7F { b'?' } else { byte })
        .collect();

    let encoded_once = legacy_url_encode(&ascii_lossy);
    Ok(legacy_url_encode(encoded_once.as_bytes()))
}

/// Verify a keyed-HMAC token.
///
/// Mirrors the MD5 scheme's trim-and-recompute approach: everything before
/// the final `&` of the URL is the signed content, and the recomputed hash
/// must equal `parsed_hash` exactly.
#[deprecated(note = "use the MD5 token scheme for new integrations")]
#[allow(deprecated)]
pub fn verify_hmac_sha256_hash(
    url: &str,
    queue_id: &str,
    place_in_queue_obfuscated: &str,
    parsed_hash: &str,
    password: &str,
) -> i64 {
    if place_in_queue_obfuscated.is_empty() {
        return MISSING_INPUT;
    }
    if queue_id.is_empty() || parsed_hash.is_empty() {
        return MISSING_INPUT;
    }
    if Uuid::parse_str(queue_id).is_err() {
        return MISSING_INPUT;
    }

    let content = match url.rfind('&') {
        Some(index) => &url[..index],
        None => return MISSING_INPUT,
    };

    let expected = match generate_hmac_sha256_hash(password, queue_id, content) {
        Ok(hash) => hash,
        Err(_) => return MISSING_INPUT,
    };

    if expected != parsed_hash {
        return HASH_MISMATCH;
    }

    match codec::decode(place_in_queue_obfuscated) {
        Ok(place) => i64::from(place),
        Err(_) => MISSING_INPUT,
    }
}

#[cfg(test)]
#[allow(deprecated)]
mod tests {
    use super::*;

    const SECRET: &str = "zaqxswcdevfrbgtnhymjukiloZAQCDEFRBGTNHYMJUKILOPlkjhgfdsapoiuytrewqmnbvcx";

    #[test]
    fn test_simple_hash_round_trip() {
        let queue_id = "87a33946-8a4d-480c-bbe1-2311fa0779d6";
        let place = "5770d948-0b09-4c17-b785-9611ef0ae03c"; // decodes to 7810
        let check = generate_simple_hash(queue_id, place, SECRET).unwrap();
        assert_eq!(verify_simple_hash(queue_id, place, SECRET, check), 7810);

        let queue_id = "b35ea550-08b3-4293-806b-ded839fcd013";
        let place = "e1c06cd0-0007-4d21-90bc-20217f0b76ee"; // decodes to 20
        let check = generate_simple_hash(queue_id, place, SECRET).unwrap();
        assert_eq!(verify_simple_hash(queue_id, place, SECRET, check), 20);
    }

    #[test]
    fn test_simple_hash_missing_input() {
        assert_eq!(verify_simple_hash("", "", "", 5141), MISSING_INPUT);
        assert_eq!(
            verify_simple_hash("87a33946-8a4d-480c-bbe1-2311fa0779d6", "", "", 5141),
            MISSING_INPUT
        );
        assert!(generate_simple_hash("", "x", SECRET).is_err());
    }

    #[test]
    fn test_simple_hash_tampered_place() {
        let queue_id = "5475dc74-8f02-408e-aae1-62e582c7764b";
        let place = "b852fe78-0d10-4254-823c-f8749c401153"; // decodes to 4212870
        let check = generate_simple_hash(queue_id, place, SECRET).unwrap();
        assert_eq!(verify_simple_hash(queue_id, place, SECRET, check), 4_212_870);

        // One character changed in the obfuscated place.
        let tampered = "b852fe78-0d10-4254-823c-f8749c101153";
        assert_eq!(verify_simple_hash(queue_id, tampered, SECRET, check), HASH_MISMATCH);
    }

    #[test]
    fn test_simple_hash_with_timestamp_round_trip() {
        let queue_id = "87a33946-8a4d-480c-bbe1-2311fa0779d6";
        let place = codec::encode(46);
        let timestamp = 1_360_241_766;
        let check =
            generate_simple_hash_with_timestamp(queue_id, &place, timestamp, SECRET).unwrap();
        assert_eq!(
            verify_simple_hash_with_timestamp(queue_id, &place, timestamp, SECRET, check),
            46
        );
        // A different timestamp invalidates the check value.
        assert_eq!(
            verify_simple_hash_with_timestamp(queue_id, &place, timestamp + 1, SECRET, check),
            HASH_MISMATCH
        );
    }

    #[test]
    fn test_extend_shared_key_cycles() {
        let key: Vec<u16> = "ab".encode_utf16().collect();
        let extended = extend_shared_key(&key, 5);
        assert_eq!(extended, "ababa".encode_utf16().collect::<Vec<u16>>());

        // Already long enough: untouched.
        let extended = extend_shared_key(&key, 1);
        assert_eq!(extended, key);
    }

    #[test]
    fn test_hmac_round_trip() {
        let queue_id = "fe070f51-5548-403c-9f0a-2626a9a5c42b";
        let place = codec::encode(7810);
        let content = format!(
            "http://example.com/target.aspx?q={queue_id}&p={place}&ts=1360241766"
        );
        let hash = generate_hmac_sha256_hash("password", queue_id, &content).unwrap();
        let url = format!("{content}&h={hash}");

        assert_eq!(
            verify_hmac_sha256_hash(&url, queue_id, &place, &hash, "password"),
            7810
        );
        assert_eq!(
            verify_hmac_sha256_hash(&url, queue_id, &place, &hash, "wrong-password"),
            HASH_MISMATCH
        );
    }

    #[test]
    fn test_legacy_url_encode_character_set() {
        // Alphanumerics and -_.!*() stay bare, space is +, the rest is
        // lowercase percent-hex.
        assert_eq!(legacy_url_encode(b"aZ09-_.!*()"), "aZ09-_.!*()");
        assert_eq!(legacy_url_encode(b"? ="), "%3f+%3d");
        assert_eq!(legacy_url_encode(&[0x5d, 0x1c, 0x18]), "%5d%1c%18");
    }

    #[test]
    fn test_hmac_verifies_service_issued_token() {
        // Disabled-queue redirect captured from the live service; the place
        // carrier decodes to the 9,999,999 sentinel. The URL is the
        // once-decoded form the host receives, the parsed hash the
        // double-encoded form carried on the wire.
        let password = "9d919dfb-00e2-4919-8695-469f5ebc91f7930edb9f-2339-4deb-864e-5f26269691b6";
        let queue_id = "00000000-0000-0000-0000-000000000000";
        let place = "87493fc9-9b96-4507-8932-db9bd29f127a";
        let parsed_hash = "%255d%251c)%253f%253c%253f3%253fJ%253f%2518%253fN%253f%253f0v%253f%253f%253fhw%253f%253f%253fJ%2518%253f%253f%253f%253f.";
        let url = format!(
            "http://www.google.com?q={queue_id}&p={place}\
             &h=%5d%1c)%3f%3c%3f3%3fJ%3f%18%3fN%3f%3f0v%3f%3f%3fhw%3f%3f%3fJ%18%3f%3f%3f%3f."
        );

        assert_eq!(
            verify_hmac_sha256_hash(&url, queue_id, place, parsed_hash, password),
            9_999_999
        );
    }

    #[test]
    fn test_simple_hash_verifies_service_issued_tokens() {
        // Disabled-queue check values captured from the live service.
        let password = "9d919dfb-00e2-4919-8695-469f5ebc91f7930edb9f-2339-4deb-864e-5f26269691b6";
        let queue_id = "00000000-0000-0000-0000-000000000000";

        assert_eq!(
            verify_simple_hash(
                queue_id,
                "86b9b819-9791-45fc-b96d-7d9c1090fef7",
                password,
                277_950
            ),
            9_999_999
        );
        assert_eq!(
            verify_simple_hash_with_timestamp(
                queue_id,
                "ffd93309-9b96-4654-a9a3-da9547920863",
                1_332_333_410,
                password,
                294_215
            ),
            9_999_999
        );
    }

    #[test]
    fn test_hmac_requires_guid_queue_id() {
        assert_eq!(
            verify_hmac_sha256_hash("http://x/?a=1&h=z", "not-a-guid", "p", "z", "pw"),
            MISSING_INPUT
        );
    }
}
