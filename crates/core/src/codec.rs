//! Place-in-queue obfuscation codec.
//!
//! The remote queue service does not put the visitor's numeric position on
//! the wire directly. It is hidden inside a GUID-shaped carrier string: a
//! random v4 GUID rendered in hyphenated text form, with the seven decimal
//! digits of the position written over fixed character positions. The
//! positions form a fixed permutation so the digits are not contiguous.
//!
//! This is obfuscation, not encryption. Integrity of the value comes from
//! the URL signature, never from this codec.

use uuid::Uuid;

/// Character positions of the place digits inside the carrier string,
/// most significant digit first. Fixed by the wire protocol.
const DIGIT_POSITIONS: [usize; 7] = [30, 3, 11, 20, 7, 26, 9];

/// Positions used by the retired 6-digit format; position 9 was still a
/// random carrier character back then.
const SIX_DIGIT_POSITIONS: [usize; 6] = [30, 3, 11, 20, 7, 26];

/// Largest encodable place. Also doubles as the remote service's
/// "unknown/disabled" sentinel value.
pub const MAX_PLACE: u32 = 9_999_999;

/// Obfuscate a queue position into a GUID-shaped string.
///
/// Places above [`MAX_PLACE`] are saturated to it; the protocol has no
/// representation for larger values.
pub fn encode(place: u32) -> String {
    let place = place.min(MAX_PLACE);
    let digits = format!("{place:07}");
    let digits = digits.as_bytes();

    let carrier = Uuid::new_v4().hyphenated().to_string();
    let mut chars = carrier.into_bytes();
    for (i, &position) in DIGIT_POSITIONS.iter().enumerate() {
        chars[position] = digits[i];
    }

    // The carrier is hyphenated hex, so overwriting single bytes with ASCII
    // digits keeps it valid UTF-8.
    String::from_utf8(chars).unwrap_or_default()
}

/// Recover a queue position from an obfuscated string.
///
/// Fails if the string is shorter than the highest digit position or any
/// referenced character is not an ASCII digit.
pub fn decode(obfuscated: &str) -> crate::Result<u32> {
    decode_positions(obfuscated, &DIGIT_POSITIONS)
}

/// Recover a queue position from a legacy 6-digit obfuscated string.
#[deprecated(note = "use decode; 6-digit tokens are no longer issued")]
pub fn decode_six_digits(obfuscated: &str) -> crate::Result<u32> {
    decode_positions(obfuscated, &SIX_DIGIT_POSITIONS)
}

fn decode_positions(obfuscated: &str, positions: &[usize]) -> crate::Result<u32> {
    let bytes = obfuscated.as_bytes();
    let mut place: u32 = 0;

    for &position in positions {
        let byte = *bytes.get(position).ok_or_else(|| {
            crate::Error::CodecFormat(format!(
                "string too short: {} chars, position {position} referenced",
                bytes.len()
            ))
        })?;
        if !byte.is_ascii_digit() {
            return Err(crate::Error::CodecFormat(format!(
                "non-digit character at position {position}"
            )));
        }
        place = place * 10 + u32::from(byte - b'0');
    }

    Ok(place)
}
