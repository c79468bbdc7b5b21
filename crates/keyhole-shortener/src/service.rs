use crate::error::{Result, ShortenerError};
use crate::shortener::Shortener;
use async_trait::async_trait;
use keyhole_core::cache::DEFAULT_CACHE_TTL;
use keyhole_core::{KeyPool, ShortKey, UrlCache, UrlRecord, UrlStore};
use std::time::Duration;
use tracing::{debug, error, trace, warn};
use typed_builder::TypedBuilder;
use url::Url;

#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct ShortenerSettings {
    /// Lifetime of cache entries written on the shortening path.
    #[builder(default = DEFAULT_CACHE_TTL)]
    pub cache_ttl: Duration,
}

impl Default for ShortenerSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// The shortening and resolution service.
///
/// Shortening takes a pre-generated key from the pool instead of minting
/// one, so the request path never searches for a free key. Resolution is
/// cache-aside: the cache is consulted first and the durable store only on
/// a miss. A store hit is not written back to the cache.
#[derive(Debug, Clone)]
pub struct UrlShortener<P, S, C> {
    pool: P,
    store: S,
    cache: C,
    settings: ShortenerSettings,
}

impl<P: KeyPool, S: UrlStore, C: UrlCache> UrlShortener<P, S, C> {
    pub fn new(pool: P, store: S, cache: C) -> Self {
        Self::with_settings(pool, store, cache, ShortenerSettings::default())
    }

    pub fn with_settings(pool: P, store: S, cache: C, settings: ShortenerSettings) -> Self {
        Self {
            pool,
            store,
            cache,
            settings,
        }
    }

    /// Accepts absolute `http`/`https` URLs with a host. The URL is stored
    /// as given, not in its normalized form, so it must not contain
    /// whitespace or control characters that parsing would silently drop.
    fn validate_url(long_url: &str) -> Result<()> {
        if long_url.is_empty() {
            return Err(ShortenerError::InvalidUrl("URL cannot be empty".to_string()));
        }

        if long_url
            .chars()
            .any(|c| c.is_whitespace() || c.is_control())
        {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL must not contain whitespace or control characters: {long_url:?}"
            )));
        }

        let parsed = Url::parse(long_url)
            .map_err(|e| ShortenerError::InvalidUrl(format!("{long_url}: {e}")))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL scheme must be http or https: {}",
                parsed.scheme()
            )));
        }

        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL must have a host: {long_url}"
            )));
        }

        Ok(())
    }

    /// Shortens `long_url` and persists the binding.
    ///
    /// The pool is only touched once the URL is known to be valid. A failed
    /// store write leaves nothing behind but consumes the popped key. A
    /// failed cache write after a successful store write is reported as
    /// [`ShortenerError::CacheWarm`], which still carries the durable record.
    pub async fn shorten_and_persist(&self, long_url: &str) -> Result<UrlRecord> {
        Self::validate_url(long_url)?;

        let key = self.pool.dequeue().await.map_err(|e| {
            warn!(error = %e, "Failed to take a key from the pool");
            ShortenerError::from(e)
        })?;
        trace!(key = %key, "Took key from pool");

        let record = UrlRecord::new(key, long_url);

        if let Err(e) = self.store.put(&record).await {
            error!(key = %record.short_key, error = %e, "Failed to persist record");
            return Err(e.into());
        }

        if let Err(e) = self
            .cache
            .set_url(&record.short_key, &record.long_url, self.settings.cache_ttl)
            .await
        {
            warn!(key = %record.short_key, error = %e, "Record persisted but cache warm failed");
            return Err(ShortenerError::CacheWarm { record, source: e });
        }

        debug!(key = %record.short_key, long_url = %record.long_url, "Shortened url");
        Ok(record)
    }

    /// Resolves `key` to its long URL, cache first.
    pub async fn resolve(&self, key: &ShortKey) -> Result<String> {
        trace!(key = %key, "Resolving short key");

        if let Some(long_url) = self.cache.get_url(key).await.map_err(|e| {
            warn!(key = %key, error = %e, "Cache lookup failed");
            ShortenerError::from(e)
        })? {
            debug!(key = %key, "Resolved from cache");
            return Ok(long_url);
        }

        match self.store.get(key).await {
            Ok(Some(record)) => {
                debug!(key = %key, "Resolved from store");
                Ok(record.long_url)
            }
            Ok(None) => {
                trace!(key = %key, "Short key not found");
                Err(ShortenerError::NotFound(key.to_string()))
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Store lookup failed");
                Err(e.into())
            }
        }
    }
}

#[async_trait]
impl<P: KeyPool, S: UrlStore, C: UrlCache> Shortener for UrlShortener<P, S, C> {
    async fn shorten_and_persist(&self, long_url: &str) -> Result<UrlRecord> {
        UrlShortener::shorten_and_persist(self, long_url).await
    }

    async fn resolve(&self, key: &ShortKey) -> Result<String> {
        UrlShortener::resolve(self, key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyhole_cache::MokaUrlCache;
    use keyhole_core::{CacheError, StorageError};
    use keyhole_pool::InMemoryKeyPool;
    use keyhole_storage::InMemoryUrlStore;

    type TestShortener = UrlShortener<InMemoryKeyPool, InMemoryUrlStore, MokaUrlCache>;

    struct Fixture {
        pool: InMemoryKeyPool,
        store: InMemoryUrlStore,
        cache: MokaUrlCache,
        service: TestShortener,
    }

    fn fixture() -> Fixture {
        let pool = InMemoryKeyPool::new();
        let store = InMemoryUrlStore::new();
        let cache = MokaUrlCache::new();
        let service = UrlShortener::new(pool.clone(), store.clone(), cache.clone());
        Fixture {
            pool,
            store,
            cache,
            service,
        }
    }

    fn key(s: &str) -> ShortKey {
        ShortKey::new_unchecked(s)
    }

    struct DownCache;

    #[async_trait]
    impl UrlCache for DownCache {
        async fn get_url(&self, _key: &ShortKey) -> keyhole_core::cache::Result<Option<String>> {
            Err(CacheError::Unavailable("connection refused".into()))
        }

        async fn set_url(
            &self,
            _key: &ShortKey,
            _long_url: &str,
            _ttl: Duration,
        ) -> keyhole_core::cache::Result<()> {
            Err(CacheError::Unavailable("connection refused".into()))
        }

        async fn del(&self, _key: &ShortKey) -> keyhole_core::cache::Result<()> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
    }

    struct DownStore;

    #[async_trait]
    impl UrlStore for DownStore {
        async fn put(&self, _record: &UrlRecord) -> keyhole_core::store::Result<()> {
            Err(StorageError::Unavailable("connection refused".into()))
        }

        async fn get(&self, _key: &ShortKey) -> keyhole_core::store::Result<Option<UrlRecord>> {
            Err(StorageError::Unavailable("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn shorten_uses_pooled_key() {
        let f = fixture();
        f.pool.enqueue(&key("abcd123")).await.unwrap();

        let record = f
            .service
            .shorten_and_persist("https://example.com")
            .await
            .unwrap();

        assert_eq!(record, UrlRecord::new(key("abcd123"), "https://example.com"));
        assert_eq!(f.pool.current_size().await.unwrap(), 0);
        assert_eq!(
            f.service.resolve(&key("abcd123")).await.unwrap(),
            "https://example.com"
        );
    }

    #[tokio::test]
    async fn shorten_persists_and_warms_cache() {
        let f = fixture();
        f.pool.enqueue(&key("abcd123")).await.unwrap();

        f.service
            .shorten_and_persist("https://example.com/a?b=c")
            .await
            .unwrap();

        let stored = f.store.get(&key("abcd123")).await.unwrap().unwrap();
        assert_eq!(stored.long_url, "https://example.com/a?b=c");
        assert_eq!(
            f.cache.get_url(&key("abcd123")).await.unwrap().as_deref(),
            Some("https://example.com/a?b=c")
        );
    }

    #[tokio::test]
    async fn shorten_with_empty_pool_fails_without_writing() {
        let f = fixture();

        let err = f
            .service
            .shorten_and_persist("https://example.com")
            .await
            .unwrap_err();

        assert!(matches!(err, ShortenerError::EmptyPool(ref pool) if pool == "available_urls"));
        assert!(f.store.is_empty());
    }

    #[tokio::test]
    async fn shorten_rejects_invalid_url_before_touching_pool() {
        let f = fixture();
        f.pool.enqueue(&key("abcd123")).await.unwrap();

        for bad in ["", "not-a-url", "ftp://example.com/file", "mailto:a@b.c", "https://"] {
            let err = f.service.shorten_and_persist(bad).await.unwrap_err();
            assert!(matches!(err, ShortenerError::InvalidUrl(_)), "{bad}");
        }

        assert_eq!(f.pool.current_size().await.unwrap(), 1);
        assert!(f.store.is_empty());
    }

    #[tokio::test]
    async fn shorten_rejects_url_that_parsing_would_rewrite() {
        let f = fixture();
        f.pool.enqueue(&key("abcd123")).await.unwrap();

        for bad in [
            "https://example.com/a\nb",
            "https://example.com/a\tb",
            " https://example.com",
            "https://example.com/a b",
            "https://example.com/\u{7f}",
        ] {
            let err = f.service.shorten_and_persist(bad).await.unwrap_err();
            assert!(matches!(err, ShortenerError::InvalidUrl(_)), "{bad:?}");
        }

        assert_eq!(f.pool.current_size().await.unwrap(), 1);
        assert!(f.store.is_empty());
    }

    #[tokio::test]
    async fn shorten_consumes_distinct_keys() {
        let f = fixture();
        f.pool.enqueue(&key("first01")).await.unwrap();
        f.pool.enqueue(&key("second2")).await.unwrap();

        let a = f.service.shorten_and_persist("https://a.example").await.unwrap();
        let b = f.service.shorten_and_persist("https://a.example").await.unwrap();

        assert_ne!(a.short_key, b.short_key);
        assert_eq!(f.store.len(), 2);
    }

    #[tokio::test]
    async fn shorten_surfaces_key_conflict() {
        let f = fixture();
        f.store
            .put(&UrlRecord::new(key("abcd123"), "https://taken.example"))
            .await
            .unwrap();
        f.pool.enqueue(&key("abcd123")).await.unwrap();

        let err = f
            .service
            .shorten_and_persist("https://example.com")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ShortenerError::KeyConflict { ref key, ref existing_url }
                if key == "abcd123" && existing_url == "https://taken.example"
        ));
        assert_eq!(
            f.store.get(&key("abcd123")).await.unwrap().unwrap().long_url,
            "https://taken.example"
        );
    }

    #[tokio::test]
    async fn shorten_reports_cache_warm_failure_with_record() {
        let pool = InMemoryKeyPool::new();
        let store = InMemoryUrlStore::new();
        pool.enqueue(&key("abcd123")).await.unwrap();
        let service = UrlShortener::new(pool, store.clone(), DownCache);

        let err = service
            .shorten_and_persist("https://example.com")
            .await
            .unwrap_err();

        match err {
            ShortenerError::CacheWarm { record, .. } => {
                assert_eq!(record.short_key, key("abcd123"));
            }
            other => panic!("expected CacheWarm, got {other:?}"),
        }
        assert!(store.exists(&key("abcd123")).await.unwrap());
    }

    #[tokio::test]
    async fn shorten_with_store_failure_returns_no_record() {
        let pool = InMemoryKeyPool::new();
        let cache = MokaUrlCache::new();
        pool.enqueue(&key("abcd123")).await.unwrap();
        let service = UrlShortener::new(pool, DownStore, cache.clone());

        let err = service
            .shorten_and_persist("https://example.com")
            .await
            .unwrap_err();

        assert!(matches!(err, ShortenerError::Storage(StorageError::Unavailable(_))));
        assert!(cache.get_url(&key("abcd123")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn resolve_falls_back_to_store() {
        let f = fixture();
        f.store
            .put(&UrlRecord::new(key("xyz1234"), "https://google.com"))
            .await
            .unwrap();

        assert_eq!(
            f.service.resolve(&key("xyz1234")).await.unwrap(),
            "https://google.com"
        );
        // No read-through warm.
        assert!(f.cache.get_url(&key("xyz1234")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn resolve_prefers_cache() {
        let f = fixture();
        f.cache
            .set_url(&key("abcd123"), "https://cached.example", DEFAULT_CACHE_TTL)
            .await
            .unwrap();

        assert_eq!(
            f.service.resolve(&key("abcd123")).await.unwrap(),
            "https://cached.example"
        );
    }

    #[tokio::test]
    async fn resolve_after_eviction_reads_store() {
        let f = fixture();
        f.pool.enqueue(&key("abcd123")).await.unwrap();
        let record = f
            .service
            .shorten_and_persist("https://example.com")
            .await
            .unwrap();

        f.cache.del(&record.short_key).await.unwrap();

        assert_eq!(
            f.service.resolve(&record.short_key).await.unwrap(),
            "https://example.com"
        );
    }

    #[tokio::test]
    async fn resolve_unknown_key() {
        let f = fixture();

        let err = f.service.resolve(&key("nope123")).await.unwrap_err();
        assert!(matches!(err, ShortenerError::NotFound(ref k) if k == "nope123"));
    }

    #[tokio::test]
    async fn resolve_is_case_sensitive() {
        let f = fixture();
        f.store
            .put(&UrlRecord::new(key("AbCd123"), "https://example.com"))
            .await
            .unwrap();

        assert!(f.service.resolve(&key("AbCd123")).await.is_ok());
        assert!(matches!(
            f.service.resolve(&key("abcd123")).await.unwrap_err(),
            ShortenerError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn resolve_propagates_cache_failure() {
        let service = UrlShortener::new(InMemoryKeyPool::new(), InMemoryUrlStore::new(), DownCache);

        let err = service.resolve(&key("abcd123")).await.unwrap_err();
        assert!(matches!(err, ShortenerError::Cache(CacheError::Unavailable(_))));
    }

    #[tokio::test]
    async fn resolve_propagates_store_failure() {
        let service = UrlShortener::new(InMemoryKeyPool::new(), DownStore, MokaUrlCache::new());

        let err = service.resolve(&key("abcd123")).await.unwrap_err();
        assert!(matches!(err, ShortenerError::Storage(StorageError::Unavailable(_))));
    }

    #[tokio::test]
    async fn concurrent_shortens_never_share_a_key() {
        let f = fixture();
        for i in 0..20 {
            f.pool.enqueue(&key(&format!("key{i:04}"))).await.unwrap();
        }

        let mut handles = vec![];
        for i in 0..25 {
            let service = f.service.clone();
            handles.push(tokio::spawn(async move {
                service
                    .shorten_and_persist(&format!("https://example.com/{i}"))
                    .await
            }));
        }

        let mut ok = 0;
        let mut empty = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(ShortenerError::EmptyPool(_)) => empty += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(ok, 20);
        assert_eq!(empty, 5);
        assert_eq!(f.store.len(), 20);
    }
}
