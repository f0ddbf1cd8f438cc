//! Identifier generation for the in-memory store.
//!
//! Durable documents use UUIDs assigned by the database layer. The mock store
//! has no database, so it builds its own short ids from the clock plus a few
//! random characters.

use chrono::Utc;
use rand::Rng;

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Width of the timestamp part. Nine base-36 digits cover millisecond
/// timestamps well past the year 5000.
const TIMESTAMP_WIDTH: usize = 9;

/// Number of random base-36 characters appended to the timestamp.
const RANDOM_SUFFIX_LEN: usize = 6;

/// Length of every id returned by [`generate_local_id`].
pub const LOCAL_ID_LEN: usize = TIMESTAMP_WIDTH + RANDOM_SUFFIX_LEN;

/// Generate a process-local identifier.
///
/// The id is the current Unix time in milliseconds in base 36, zero-padded to
/// nine characters, followed by six random base-36 characters. Ids are
/// fixed-length, URL-safe and unique with overwhelming probability within a
/// single process. They are not unpredictable and must not be used as secrets.
///
/// ```
/// use rootedlane_core::{LOCAL_ID_LEN, generate_local_id};
///
/// let id = generate_local_id();
/// assert_eq!(id.len(), LOCAL_ID_LEN);
/// assert!(id.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
/// ```
#[must_use]
pub fn generate_local_id() -> String {
    let millis = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();

    let mut id = to_base36(millis, TIMESTAMP_WIDTH);
    let mut rng = rand::rng();
    for _ in 0..RANDOM_SUFFIX_LEN {
        let index = rng.random_range(0..ALPHABET.len());
        id.push(char::from(ALPHABET.get(index).copied().unwrap_or(b'0')));
    }
    id
}

/// Encode `value` in base 36, left-padded with zeros to `width` characters.
fn to_base36(mut value: u64, width: usize) -> String {
    let mut digits = Vec::with_capacity(width);
    while value > 0 {
        let index = usize::try_from(value % 36).unwrap_or_default();
        digits.push(ALPHABET.get(index).copied().unwrap_or(b'0'));
        value /= 36;
    }
    while digits.len() < width {
        digits.push(b'0');
    }
    digits.iter().rev().map(|&b| char::from(b)).collect()
}
