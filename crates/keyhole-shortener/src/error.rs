use keyhole_core::{CacheError, CoreError, PoolError, StorageError, UrlRecord};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ShortenerError>;

#[derive(Debug, Clone, Error)]
pub enum ShortenerError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid short key: {0}")]
    InvalidShortKey(String),
    /// Retryable: the generator has not caught up with demand.
    #[error("there are no keys left on pool {0}")]
    EmptyPool(String),
    #[error("short key '{key}' is already bound to '{existing_url}'")]
    KeyConflict { key: String, existing_url: String },
    #[error("short key not found: {0}")]
    NotFound(String),
    /// The record is durable but the cache write failed.
    #[error("record for '{}' persisted but cache warm failed: {source}", .record.short_key)]
    CacheWarm {
        record: UrlRecord,
        #[source]
        source: CacheError,
    },
    #[error("pool error: {0}")]
    Pool(PoolError),
    #[error("storage error: {0}")]
    Storage(StorageError),
    #[error("cache error: {0}")]
    Cache(CacheError),
}

impl From<CoreError> for ShortenerError {
    fn from(value: CoreError) -> Self {
        match value {
            CoreError::InvalidShortKey(message) => Self::InvalidShortKey(message),
        }
    }
}

impl From<PoolError> for ShortenerError {
    fn from(value: PoolError) -> Self {
        match value {
            PoolError::Empty(pool) => Self::EmptyPool(pool),
            other => Self::Pool(other),
        }
    }
}

impl From<StorageError> for ShortenerError {
    fn from(value: StorageError) -> Self {
        match value {
            StorageError::Conflict { key, existing_url } => {
                Self::KeyConflict { key, existing_url }
            }
            other => Self::Storage(other),
        }
    }
}

impl From<CacheError> for ShortenerError {
    fn from(value: CacheError) -> Self {
        Self::Cache(value)
    }
}
