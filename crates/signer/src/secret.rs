//! Shared-secret generation.

use rand::Rng;

/// Generate a random shared secret of `length` printable-ASCII characters.
///
/// The alphabet is `!` through `}` inclusive, matching the keys issued by
/// the queue service's account tooling.
pub fn generate_random_secret_key(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(rng.gen_range(0x21u8..0x7E)))
        .collect()
}
