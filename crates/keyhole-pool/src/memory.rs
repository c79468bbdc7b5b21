use async_trait::async_trait;
use keyhole_core::pool::{Result, DEFAULT_POOL_NAME};
use keyhole_core::{KeyPool, PoolError, ShortKey};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::trace;

/// In-process key pool.
///
/// A single mutex makes push and pop atomic. Clones share the same pool,
/// which lets the generator worker and the shortener run against one
/// instance inside a single process.
#[derive(Debug, Clone)]
pub struct InMemoryKeyPool {
    name: String,
    keys: Arc<Mutex<VecDeque<ShortKey>>>,
}

impl InMemoryKeyPool {
    pub fn new() -> Self {
        Self::with_name(DEFAULT_POOL_NAME)
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keys: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.keys.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.lock().is_empty()
    }

    /// Returns `true` if the pool currently holds `key`.
    pub fn contains(&self, key: &ShortKey) -> bool {
        self.keys.lock().contains(key)
    }
}

impl Default for InMemoryKeyPool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyPool for InMemoryKeyPool {
    async fn enqueue(&self, key: &ShortKey) -> Result<usize> {
        let mut keys = self.keys.lock();
        keys.push_front(key.clone());
        trace!(pool = %self.name, key = %key, size = keys.len(), "Enqueued key");
        Ok(keys.len())
    }

    async fn dequeue(&self) -> Result<ShortKey> {
        let key = self.keys.lock().pop_back();
        match key {
            Some(key) => {
                trace!(pool = %self.name, key = %key, "Dequeued key");
                Ok(key)
            }
            None => Err(PoolError::Empty(self.name.clone())),
        }
    }

    async fn current_size(&self) -> Result<usize> {
        Ok(self.keys.lock().len())
    }
}
