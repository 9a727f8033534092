//! Response cache trait: exact-match key/value storage with expiry.
//!
//! Plain GET/SET semantics, no transactions. Two concurrent misses on the
//! same key may both write; the last write wins.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::StoreError;

/// Implementations: Redis, in-memory (for testing).
#[async_trait]
pub trait ResponseCache: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch a live entry. Expired entries read as `None`.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store a value that expires after `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;
}
