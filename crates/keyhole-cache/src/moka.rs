use async_trait::async_trait;
use keyhole_core::cache::Result;
use keyhole_core::{ShortKey, UrlCache};
use ::moka::future::Cache;
use ::moka::Expiry;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// A cached long URL together with the TTL it was stored with.
#[derive(Debug, Clone)]
struct CachedUrl {
    long_url: String,
    ttl: Duration,
}

/// Expires each entry after the TTL passed to its `set_url` call.
struct PerEntryTtl;

impl Expiry<ShortKey, CachedUrl> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &ShortKey,
        value: &CachedUrl,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &ShortKey,
        value: &CachedUrl,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// An in-memory cache implementation using Moka.
///
/// Suited to single-node deployments and tests. Unlike a plain moka cache
/// with a global `time_to_live`, every entry honours the TTL given when it
/// was written. Clones share the same underlying cache.
#[derive(Debug, Clone)]
pub struct MokaUrlCache {
    cache: Cache<ShortKey, CachedUrl>,
}

impl MokaUrlCache {
    /// Creates a new Moka URL cache with default settings.
    ///
    /// The cache will have a default maximum capacity of 10,000 entries.
    pub fn new() -> Self {
        Self::with_capacity(10_000)
    }

    /// Creates a new Moka URL cache with a custom maximum capacity.
    pub fn with_capacity(max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .build();
        Self { cache }
    }
}

impl Default for MokaUrlCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UrlCache for MokaUrlCache {
    async fn get_url(&self, key: &ShortKey) -> Result<Option<String>> {
        trace!(key = %key, "Fetching long url from Moka cache");

        match self.cache.get(key).await {
            Some(cached) => {
                debug!(key = %key, "Cache hit in Moka");
                Ok(Some(cached.long_url))
            }
            None => {
                trace!(key = %key, "Cache miss in Moka");
                Ok(None)
            }
        }
    }

    async fn set_url(&self, key: &ShortKey, long_url: &str, ttl: Duration) -> Result<()> {
        trace!(key = %key, ttl_secs = ttl.as_secs(), "Storing long url in Moka cache");

        let value = CachedUrl {
            long_url: long_url.to_owned(),
            ttl,
        };
        self.cache.insert(key.clone(), value).await;
        debug!(key = %key, "Cached long url in Moka");
        Ok(())
    }

    async fn del(&self, key: &ShortKey) -> Result<()> {
        trace!(key = %key, "Removing long url from Moka cache");

        self.cache.invalidate(key).await;
        debug!(key = %key, "Removed long url from Moka cache (if present)");
        Ok(())
    }
}
