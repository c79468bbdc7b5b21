use crate::error::CacheError;
use crate::short_key::ShortKey;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Default lifetime of a cached binding: 30 days.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// A TTL cache in front of the durable store.
///
/// Values are the long URLs themselves, keyed by [`ShortKey`].
/// Implementations can use Redis, in-memory caches, or other backends.
#[async_trait]
pub trait UrlCache: Send + Sync + 'static {
    /// Get the long URL for a key.
    ///
    /// Returns `Ok(None)` if the key is not in the cache.
    async fn get_url(&self, key: &ShortKey) -> Result<Option<String>>;

    /// Store the long URL for a key, expiring after `ttl`.
    async fn set_url(&self, key: &ShortKey, long_url: &str, ttl: Duration) -> Result<()>;

    /// Remove a key from the cache.
    /// It is not an error if the key does not exist.
    async fn del(&self, key: &ShortKey) -> Result<()>;
}

#[async_trait]
impl<T: UrlCache + ?Sized> UrlCache for Arc<T> {
    async fn get_url(&self, key: &ShortKey) -> Result<Option<String>> {
        (**self).get_url(key).await
    }

    async fn set_url(&self, key: &ShortKey, long_url: &str, ttl: Duration) -> Result<()> {
        (**self).set_url(key, long_url, ttl).await
    }

    async fn del(&self, key: &ShortKey) -> Result<()> {
        (**self).del(key).await
    }
}
