use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use keyhole_core::store::Result;
use keyhole_core::{ShortKey, StorageError, UrlRecord, UrlStore};
use std::sync::Arc;
use tracing::{debug, trace};

/// In-memory implementation of [`UrlStore`] using DashMap.
///
/// DashMap provides better concurrency than RwLock<HashMap> because it
/// uses sharded locks, allowing concurrent reads and writes to different
/// buckets without blocking. Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUrlStore {
    storage: Arc<DashMap<ShortKey, String>>,
}

impl InMemoryUrlStore {
    /// Creates a new in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bindings held.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

#[async_trait]
impl UrlStore for InMemoryUrlStore {
    async fn put(&self, record: &UrlRecord) -> Result<()> {
        trace!(key = %record.short_key, "Persisting record in memory");

        // The entry guard holds the shard lock, so check-and-insert is atomic.
        match self.storage.entry(record.short_key.clone()) {
            Entry::Occupied(existing) if existing.get() == &record.long_url => {
                debug!(key = %record.short_key, "Identical record already stored");
                Ok(())
            }
            Entry::Occupied(existing) => Err(StorageError::Conflict {
                key: record.short_key.to_string(),
                existing_url: existing.get().clone(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(record.long_url.clone());
                Ok(())
            }
        }
    }

    async fn get(&self, key: &ShortKey) -> Result<Option<UrlRecord>> {
        Ok(self
            .storage
            .get(key)
            .map(|long_url| UrlRecord::new(key.clone(), long_url.value().clone())))
    }

    async fn exists(&self, key: &ShortKey) -> Result<bool> {
        Ok(self.storage.contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> ShortKey {
        ShortKey::new_unchecked(s)
    }

    fn record(k: &str, url: &str) -> UrlRecord {
        UrlRecord::new(key(k), url)
    }

    #[tokio::test]
    async fn put_and_get() {
        let store = InMemoryUrlStore::new();

        store
            .put(&record("abcd123", "https://example.com"))
            .await
            .unwrap();

        let result = store.get(&key("abcd123")).await.unwrap().unwrap();
        assert_eq!(result.short_key.as_str(), "abcd123");
        assert_eq!(result.long_url, "https://example.com");
    }

    #[tokio::test]
    async fn get_nonexistent() {
        let store = InMemoryUrlStore::new();

        assert!(store.get(&key("nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_same_pair_twice_is_idempotent() {
        let store = InMemoryUrlStore::new();
        let r = record("abcd123", "https://example.com");

        store.put(&r).await.unwrap();
        store.put(&r).await.unwrap();

        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn put_conflicting_url_is_rejected() {
        let store = InMemoryUrlStore::new();

        store
            .put(&record("abcd123", "https://example.com"))
            .await
            .unwrap();

        let err = store
            .put(&record("abcd123", "https://other.com"))
            .await
            .unwrap_err();

        match err {
            StorageError::Conflict { key, existing_url } => {
                assert_eq!(key, "abcd123");
                assert_eq!(existing_url, "https://example.com");
            }
            other => panic!("expected conflict, got {other:?}"),
        }

        // The original binding is untouched.
        let stored = store.get(&key("abcd123")).await.unwrap().unwrap();
        assert_eq!(stored.long_url, "https://example.com");
    }

    #[tokio::test]
    async fn keys_are_case_sensitive() {
        let store = InMemoryUrlStore::new();

        store.put(&record("abcdefg", "https://a.com")).await.unwrap();
        store.put(&record("ABCDEFG", "https://b.com")).await.unwrap();

        assert_eq!(
            store.get(&key("abcdefg")).await.unwrap().unwrap().long_url,
            "https://a.com"
        );
        assert_eq!(
            store.get(&key("ABCDEFG")).await.unwrap().unwrap().long_url,
            "https://b.com"
        );
    }

    #[tokio::test]
    async fn exists_checks() {
        let store = InMemoryUrlStore::new();

        assert!(!store.exists(&key("abcd123")).await.unwrap());

        store
            .put(&record("abcd123", "https://example.com"))
            .await
            .unwrap();

        assert!(store.exists(&key("abcd123")).await.unwrap());
    }

    #[tokio::test]
    async fn clones_share_state() {
        let store = InMemoryUrlStore::new();
        let other = store.clone();

        store
            .put(&record("abcd123", "https://example.com"))
            .await
            .unwrap();

        assert!(other.exists(&key("abcd123")).await.unwrap());
    }

    #[tokio::test]
    async fn concurrent_conflicting_puts_bind_exactly_once() {
        let store = InMemoryUrlStore::new();
        let mut handles = vec![];

        for i in 0..10u64 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .put(&record("race123", &format!("https://example{i}.com")))
                    .await
                    .is_ok()
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap() {
                successes += 1;
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(store.len(), 1);
    }
}
