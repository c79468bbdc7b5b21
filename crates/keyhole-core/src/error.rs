use thiserror::Error;

/// Errors raised while validating domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid short key: {0}")]
    InvalidShortKey(String),
}

/// Errors returned by [`UrlCache`](crate::UrlCache) backends.
///
/// A cache miss is not an error: lookups return `Ok(None)`.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache operation timed out: {0}")]
    Timeout(String),
    #[error("cache serialization failed: {0}")]
    Serialization(String),
    #[error("cache value is invalid: {0}")]
    InvalidData(String),
    #[error("cache initialization failed: {0}")]
    Initialization(String),
    #[error("cache operation failed: {0}")]
    Operation(String),
}

/// Errors returned by [`UrlStore`](crate::UrlStore) backends.
///
/// A missing record is not an error: lookups return `Ok(None)`.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("short key '{key}' is already bound to '{existing_url}'")]
    Conflict { key: String, existing_url: String },
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage operation failed: {0}")]
    Operation(String),
}

/// Errors returned by [`KeyPool`](crate::KeyPool) backends.
#[derive(Debug, Clone, Error)]
pub enum PoolError {
    #[error("there are no keys left on pool {0}")]
    Empty(String),
    #[error("pool backend unavailable: {0}")]
    Unavailable(String),
    #[error("pool operation timed out: {0}")]
    Timeout(String),
    #[error("pooled value is invalid: {0}")]
    InvalidData(String),
    #[error("pool operation failed: {0}")]
    Operation(String),
}
