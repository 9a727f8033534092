//! Response cache backends.
//!
//! - [`RedisResponseCache`]: `GET` / `SET EX` over a multiplexed connection
//! - [`InMemoryResponseCache`]: a `HashMap` with expiry instants, for tests
//!   and ephemeral sessions

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info};

use academaide_core::cache::ResponseCache;
use academaide_core::error::StoreError;

/// Redis-backed reply cache.
///
/// The connection manager reconnects on its own; clones share one
/// multiplexed connection.
#[derive(Clone)]
pub struct RedisResponseCache {
    conn: ConnectionManager,
}

impl RedisResponseCache {
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| StoreError::Connection(format!("Invalid Redis URL: {e}")))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| StoreError::Connection(format!("Redis connection failed: {e}")))?;

        info!("Connected to Redis");
        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| StoreError::Connection(format!("Redis ping failed: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl ResponseCache for RedisResponseCache {
    fn name(&self) -> &str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("Redis GET failed: {e}")))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        // SET EX rejects zero; round sub-second TTLs up.
        let secs = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, secs)
            .await
            .map_err(|e| StoreError::WriteFailed(format!("Redis SET failed: {e}")))?;

        debug!(key = %key, ttl_secs = secs, "Cached reply");
        Ok(())
    }
}

/// An in-process cache with per-entry expiry.
///
/// Expiry uses `tokio::time::Instant`, so paused-clock tests can step past
/// the TTL without sleeping.
#[derive(Clone, Default)]
pub struct InMemoryResponseCache {
    entries: Arc<RwLock<HashMap<String, (String, Instant)>>>,
}

impl InMemoryResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|(_, expires_at)| *expires_at > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ResponseCache for InMemoryResponseCache {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|(_, expires_at)| *expires_at > now)
            .map(|(value, _)| value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, (_, expires_at)| *expires_at > now);
        entries.insert(key.to_string(), (value.to_string(), now + ttl));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get() {
        let cache = InMemoryResponseCache::new();
        cache.set("response:abc", "hello", Duration::from_secs(300)).await.unwrap();
        assert_eq!(cache.get("response:abc").await.unwrap().as_deref(), Some("hello"));
        assert_eq!(cache.get("response:other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn last_write_wins() {
        let cache = InMemoryResponseCache::new();
        cache.set("k", "first", Duration::from_secs(60)).await.unwrap();
        cache.set("k", "second", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("second"));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = InMemoryResponseCache::new();
        cache.set("k", "v", Duration::from_secs(300)).await.unwrap();

        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(cache.get("k").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get("k").await.unwrap().is_none());
        assert!(cache.is_empty().await);
    }
}
