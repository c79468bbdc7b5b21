use ::redis::AsyncCommands;
use async_trait::async_trait;
use keyhole_core::cache::Result;
use keyhole_core::{CacheError, ShortKey, UrlCache};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// A Redis-based implementation of [`UrlCache`].
///
/// Long URLs are stored as plain string values under a configurable key
/// prefix and written with `SET ... EX` so Redis expires them.
#[derive(Debug, Clone)]
pub struct RedisUrlCache {
    conn: ::redis::aio::MultiplexedConnection,
    key_prefix: String,
}

fn map_redis_error(operation: &str, err: ::redis::RedisError) -> CacheError {
    let message = format!("{operation}: {err}");
    if message.to_ascii_lowercase().contains("timed out") {
        CacheError::Timeout(message)
    } else if err.is_io_error() {
        CacheError::Unavailable(message)
    } else {
        CacheError::Operation(message)
    }
}

impl RedisUrlCache {
    /// Creates a new Redis URL cache.
    ///
    /// # Arguments
    ///
    /// * `conn` - A multiplexed Redis connection
    pub fn new(conn: ::redis::aio::MultiplexedConnection) -> Self {
        Self::with_prefix(conn, "kh:url:")
    }

    /// Creates a new Redis URL cache with a custom key prefix.
    ///
    /// # Arguments
    ///
    /// * `conn` - A multiplexed Redis connection
    /// * `key_prefix` - Custom prefix for cache keys (e.g., "myapp:url:")
    pub fn with_prefix(
        conn: ::redis::aio::MultiplexedConnection,
        key_prefix: impl Into<String>,
    ) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
        }
    }

    /// Generates the cache key for a short key.
    pub fn cache_key(&self, key: &ShortKey) -> String {
        format!("{}{}", self.key_prefix, key.as_str())
    }
}

#[async_trait]
impl UrlCache for RedisUrlCache {
    async fn get_url(&self, key: &ShortKey) -> Result<Option<String>> {
        let cache_key = self.cache_key(key);
        trace!(key = %key, "Fetching long url from Redis cache");

        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(&cache_key).await {
            Ok(Some(long_url)) => {
                debug!(key = %key, "Cache hit in Redis");
                Ok(Some(long_url))
            }
            Ok(None) => {
                trace!(key = %key, "Cache miss in Redis");
                Ok(None)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Redis error on get");
                Err(map_redis_error("failed to fetch value from Redis", e))
            }
        }
    }

    async fn set_url(&self, key: &ShortKey, long_url: &str, ttl: Duration) -> Result<()> {
        let cache_key = self.cache_key(key);
        // EX rejects zero, and a sub-second TTL still has to expire.
        let seconds = ttl.as_secs().max(1);
        trace!(key = %key, ttl_secs = seconds, "Storing long url in Redis cache");

        let mut conn = self.conn.clone();
        match conn.set_ex::<_, _, ()>(&cache_key, long_url, seconds).await {
            Ok(()) => {
                debug!(key = %key, "Cached long url in Redis");
                Ok(())
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to cache long url in Redis");
                Err(map_redis_error("failed to write value to Redis", e))
            }
        }
    }

    async fn del(&self, key: &ShortKey) -> Result<()> {
        let cache_key = self.cache_key(key);
        trace!(key = %key, "Removing long url from Redis cache");

        let mut conn = self.conn.clone();
        match conn.del::<_, ()>(&cache_key).await {
            Ok(()) => {
                debug!(key = %key, "Removed long url from Redis cache");
                Ok(())
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to remove long url from Redis cache");
                Err(map_redis_error("failed to delete value from Redis", e))
            }
        }
    }
}
