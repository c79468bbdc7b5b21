use crate::error::Result;
use async_trait::async_trait;
use keyhole_core::{ShortKey, UrlRecord};

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Binds a fresh key from the pool to `long_url` and returns the
    /// persisted record.
    async fn shorten_and_persist(&self, long_url: &str) -> Result<UrlRecord>;

    /// Returns the long URL bound to `key`.
    async fn resolve(&self, key: &ShortKey) -> Result<String>;
}
