use rand::Rng;
use time::OffsetDateTime;

use super::constants::{ID_RANDOM_SUFFIX_LEN, MAX_ID_PREFIX_LEN};

const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Builds a new entity id: a slug of `name` (if any), a random base36 block
/// and the current unix time in milliseconds, also base36.
pub fn generate_id(name: Option<&str>) -> String {
    let prefix = name.map(slug_prefix).unwrap_or_default();
    let random_upper_bound = 36u64.pow(ID_RANDOM_SUFFIX_LEN as u32);
    let random = rand::thread_rng().gen_range(0..random_upper_bound);
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;

    format!(
        "{prefix}{}{}",
        to_base36_padded(u128::from(random), ID_RANDOM_SUFFIX_LEN),
        to_base36(u128::try_from(millis).unwrap_or_default())
    )
}

pub(crate) fn slug_prefix(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .take(MAX_ID_PREFIX_LEN)
        .collect()
}

fn to_base36(mut value: u128) -> String {
    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

fn to_base36_padded(value: u128, width: usize) -> String {
    format!("{:0>width$}", to_base36(value), width = width)
}
