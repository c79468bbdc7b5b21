use crate::error::StorageError;
use crate::short_key::ShortKey;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Result type for durable store operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A short key bound to the long URL it resolves to.
///
/// Records are immutable once written and are never deleted from the
/// durable store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRecord {
    #[serde(rename = "short_url")]
    pub short_key: ShortKey,
    pub long_url: String,
}

impl UrlRecord {
    pub fn new(short_key: ShortKey, long_url: impl Into<String>) -> Self {
        Self {
            short_key,
            long_url: long_url.into(),
        }
    }
}

/// The durable table of short key to long URL bindings.
#[async_trait]
pub trait UrlStore: Send + Sync + 'static {
    /// Persists a record.
    ///
    /// Writing the exact same pair again is a no-op. Writing a key that is
    /// already bound to a different URL fails with
    /// [`StorageError::Conflict`]; an existing binding is never overwritten.
    async fn put(&self, record: &UrlRecord) -> Result<()>;

    /// Retrieves the record for a given short key.
    /// Returns `None` if the key has never been written.
    async fn get(&self, key: &ShortKey) -> Result<Option<UrlRecord>>;

    /// Checks whether a short key is already bound.
    async fn exists(&self, key: &ShortKey) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }
}

#[async_trait]
impl<T: UrlStore + ?Sized> UrlStore for Arc<T> {
    async fn put(&self, record: &UrlRecord) -> Result<()> {
        (**self).put(record).await
    }

    async fn get(&self, key: &ShortKey) -> Result<Option<UrlRecord>> {
        (**self).get(key).await
    }

    async fn exists(&self, key: &ShortKey) -> Result<bool> {
        (**self).exists(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_uses_short_url_on_the_wire() {
        let record = UrlRecord::new(
            ShortKey::new("abcd123").unwrap(),
            "https://en.wikipedia.org/wiki/Hermeto_Pascoal",
        );

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["short_url"], "abcd123");
        assert_eq!(
            json["long_url"],
            "https://en.wikipedia.org/wiki/Hermeto_Pascoal"
        );

        let back: UrlRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
