//! Locator Keys
//!
//! Turns source locators into canonical cache keys and derives stable
//! file-system names from keys.

use sha2::{Digest, Sha256};
use url::Url;

use crate::cache::MAX_LOCATOR_LENGTH;
use crate::error::{CacheError, Result};

/// Normalizes a locator into its canonical cache key.
///
/// The locator must be an absolute URL. Scheme and host are lowercased,
/// default ports and dot segments are dropped by the URL parser, and the
/// fragment is removed since it never reaches the origin. Query strings are
/// kept verbatim: signed media URLs depend on them.
pub fn normalize_locator(locator: &str) -> Result<String> {
    let trimmed = locator.trim();
    if trimmed.is_empty() {
        return Err(CacheError::InvalidLocator(
            "Locator cannot be empty".to_string(),
        ));
    }
    if trimmed.len() > MAX_LOCATOR_LENGTH {
        return Err(CacheError::InvalidLocator(format!(
            "Locator exceeds maximum length of {} bytes",
            MAX_LOCATOR_LENGTH
        )));
    }

    let mut url = Url::parse(trimmed)
        .map_err(|e| CacheError::InvalidLocator(format!("{}: {}", trimmed, e)))?;
    if url.cannot_be_a_base() {
        return Err(CacheError::InvalidLocator(format!(
            "{}: not a hierarchical URL",
            trimmed
        )));
    }
    url.set_fragment(None);

    Ok(url.into())
}

/// Hex-encoded SHA-256 of a key, used to name payload files.
pub fn key_digest(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}
