//! Response cache keys.
//!
//! The key is a hash of the raw message bytes only. It is not scoped by
//! user, so two users sending identical text share one cached reply
//! within the TTL.

use sha2::{Digest, Sha256};

/// `prefix` followed by the lowercase hex SHA-256 of `message`.
pub fn response_cache_key(prefix: &str, message: &str) -> String {
    let digest = Sha256::digest(message.as_bytes());
    format!("{prefix}{}", hex::encode(digest))
}
