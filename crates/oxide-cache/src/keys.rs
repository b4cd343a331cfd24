//! Cache key validation utilities.

use oxide_core::cache::{CacheKey, MAX_KEY_COUNT, MAX_KEY_LENGTH};
use oxide_core::{Error, Result};
use tracing::debug;

/// Validate and normalize a priority-ordered key list.
///
/// Keys longer than [`MAX_KEY_LENGTH`] characters are truncated rather than
/// rejected. Order is preserved.
pub fn validate_keys<S: AsRef<str>>(keys: &[S]) -> Result<Vec<CacheKey>> {
    if keys.is_empty() {
        return Err(Error::NoKeysProvided);
    }
    if keys.len() > MAX_KEY_COUNT {
        return Err(Error::TooManyKeys {
            max: MAX_KEY_COUNT,
            provided: keys.len(),
        });
    }

    let mut validated = Vec::with_capacity(keys.len());
    for key in keys {
        let key = key.as_ref();
        if key.contains(',') {
            return Err(Error::InvalidKey(key.to_string()));
        }
        validated.push(CacheKey::new_unchecked(truncate_key(key)));
    }

    Ok(validated)
}

/// Truncate a key to [`MAX_KEY_LENGTH`] characters.
pub fn truncate_key(key: &str) -> &str {
    match key.char_indices().nth(MAX_KEY_LENGTH) {
        Some((end, _)) => {
            debug!(original_len = key.chars().count(), "Truncating cache key");
            &key[..end]
        }
        None => key,
    }
}

/// Split a newline-separated key block into individual keys.
///
/// Blank lines are skipped and surrounding whitespace trimmed. Commas are
/// kept so that validation can reject them.
pub fn parse_key_list(input: &str) -> Vec<String> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
