use crate::error::Result;
use crate::random::KeyGenerator;
use keyhole_core::{KeyPool, ShortKey, UrlStore};
use tracing::{debug, trace, warn};

/// Moves fresh candidates into the available-key pool.
///
/// A candidate only reaches the pool when the store has no binding for it.
/// The check is best-effort: a key can still be bound between the check and
/// its assignment, which the store's conflict detection catches on write.
#[derive(Debug, Clone)]
pub struct KeyReplenisher<P, S, G> {
    pool: P,
    store: S,
    generator: G,
    key_size: usize,
}

impl<P: KeyPool, S: UrlStore, G: KeyGenerator> KeyReplenisher<P, S, G> {
    /// Creates a replenisher minting keys of `key_size` characters.
    pub fn new(pool: P, store: S, generator: G, key_size: usize) -> Self {
        Self {
            pool,
            store,
            generator,
            key_size,
        }
    }

    /// Generates one candidate and enqueues it if the store has not seen it.
    ///
    /// Returns `true` when the candidate was enqueued and `false` when it
    /// collided with an existing binding. Adapter errors propagate.
    pub async fn generate_and_enqueue(&self) -> Result<bool> {
        let candidate = self.generator.generate(self.key_size);
        self.enqueue_candidate(candidate).await
    }

    /// Enqueues a caller-supplied candidate under the same rule as
    /// [`generate_and_enqueue`](Self::generate_and_enqueue).
    pub async fn enqueue_candidate(&self, candidate: ShortKey) -> Result<bool> {
        let exists = self.exists_in_store(&candidate).await.map_err(|e| {
            warn!(key = %candidate, operation = "exists", error = %e, "Collision check failed");
            e
        })?;
        if exists {
            debug!(key = %candidate, "Candidate already bound, discarding");
            return Ok(false);
        }

        let size = self.pool.enqueue(&candidate).await.map_err(|e| {
            warn!(key = %candidate, operation = "enqueue", error = %e, "Failed to enqueue candidate");
            e
        })?;
        trace!(key = %candidate, pool_size = size, "Candidate enqueued");
        Ok(true)
    }

    /// Returns `false` only when the store explicitly has no binding.
    pub async fn exists_in_store(&self, key: &ShortKey) -> Result<bool> {
        Ok(self.store.exists(key).await?)
    }

    /// Current number of keys waiting in the pool.
    pub async fn pool_size(&self) -> Result<usize> {
        self.pool.current_size().await.map_err(|e| {
            warn!(operation = "size", error = %e, "Failed to read pool size");
            e.into()
        })
    }
}
