use ::redis::AsyncCommands;
use async_trait::async_trait;
use keyhole_core::pool::{Result, DEFAULT_POOL_NAME};
use keyhole_core::{KeyPool, PoolError, ShortKey};
use tracing::{debug, trace, warn};

/// A Redis list acting as the pool of available short keys.
///
/// Keys are pushed with `LPUSH` and popped with `RPOP`. Both are single
/// atomic commands, so any number of shortener instances and generator
/// processes can share one list.
#[derive(Debug, Clone)]
pub struct RedisKeyPool {
    conn: ::redis::aio::MultiplexedConnection,
    name: String,
}

fn map_redis_error(operation: &str, err: ::redis::RedisError) -> PoolError {
    let message = format!("{operation}: {err}");
    if message.to_ascii_lowercase().contains("timed out") {
        PoolError::Timeout(message)
    } else if err.is_io_error() {
        PoolError::Unavailable(message)
    } else {
        PoolError::Operation(message)
    }
}

impl RedisKeyPool {
    /// Creates a pool backed by the list named [`DEFAULT_POOL_NAME`].
    pub fn new(conn: ::redis::aio::MultiplexedConnection) -> Self {
        Self::with_name(conn, DEFAULT_POOL_NAME)
    }

    /// Creates a pool backed by the list `name`.
    pub fn with_name(conn: ::redis::aio::MultiplexedConnection, name: impl Into<String>) -> Self {
        Self {
            conn,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl KeyPool for RedisKeyPool {
    async fn enqueue(&self, key: &ShortKey) -> Result<usize> {
        let mut conn = self.conn.clone();
        match conn.lpush::<_, _, usize>(&self.name, key.as_str()).await {
            Ok(size) => {
                trace!(pool = %self.name, key = %key, size, "Enqueued key");
                Ok(size)
            }
            Err(e) => {
                warn!(pool = %self.name, key = %key, error = %e, "Failed to enqueue key");
                Err(map_redis_error("failed to push key to Redis", e))
            }
        }
    }

    async fn dequeue(&self) -> Result<ShortKey> {
        let mut conn = self.conn.clone();
        let raw = conn
            .rpop::<_, Option<String>>(&self.name, None)
            .await
            .map_err(|e| {
                warn!(pool = %self.name, error = %e, "Failed to dequeue key");
                map_redis_error("failed to pop key from Redis", e)
            })?;

        let Some(raw) = raw else {
            debug!(pool = %self.name, "Pool is empty");
            return Err(PoolError::Empty(self.name.clone()));
        };

        // The popped entry is gone either way; a malformed one is surfaced
        // rather than pushed back.
        let key = ShortKey::new(raw.as_str()).map_err(|e| {
            warn!(pool = %self.name, key = %raw, error = %e, "Dropped malformed pool entry");
            PoolError::InvalidData(e.to_string())
        })?;
        trace!(pool = %self.name, key = %key, "Dequeued key");
        Ok(key)
    }

    async fn current_size(&self) -> Result<usize> {
        let mut conn = self.conn.clone();
        conn.llen::<_, usize>(&self.name).await.map_err(|e| {
            warn!(pool = %self.name, operation = "size", error = %e, "Failed to read pool size");
            map_redis_error("failed to read pool size from Redis", e)
        })
    }
}
