use crate::error::PoolError;
use crate::short_key::ShortKey;
use async_trait::async_trait;
use std::sync::Arc;

/// Result type for pool operations.
pub type Result<T> = std::result::Result<T, PoolError>;

/// Name of the pool list when a deployment does not configure one.
pub const DEFAULT_POOL_NAME: &str = "available_urls";

/// The pool of pre-generated short keys awaiting assignment.
///
/// Push and pop must be atomic across concurrent callers: two concurrent
/// [`dequeue`](KeyPool::dequeue) calls never return the same entry. Pop
/// order is unspecified since keys are interchangeable.
#[async_trait]
pub trait KeyPool: Send + Sync + 'static {
    /// Adds a key to the pool and returns the pool size after the push.
    async fn enqueue(&self, key: &ShortKey) -> Result<usize>;

    /// Removes and returns one key.
    ///
    /// Fails with [`PoolError::Empty`] when no keys remain.
    async fn dequeue(&self) -> Result<ShortKey>;

    /// Returns the number of keys currently in the pool.
    async fn current_size(&self) -> Result<usize>;
}

#[async_trait]
impl<T: KeyPool + ?Sized> KeyPool for Arc<T> {
    async fn enqueue(&self, key: &ShortKey) -> Result<usize> {
        (**self).enqueue(key).await
    }

    async fn dequeue(&self) -> Result<ShortKey> {
        (**self).dequeue().await
    }

    async fn current_size(&self) -> Result<usize> {
        (**self).current_size().await
    }
}
