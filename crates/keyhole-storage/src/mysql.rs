use async_trait::async_trait;
use jiff::Timestamp;
use keyhole_core::store::Result;
use keyhole_core::{ShortKey, StorageError, UrlRecord, UrlStore};
use sqlx::{MySqlPool, Row};
use tracing::{debug, trace, warn};

const SCHEMA: &str = include_str!("../ddl/mysql/short_urls.sql");

/// MySQL implementation of the durable store contract.
///
/// `short_key` is the primary key with a binary collation, so keys are
/// case-sensitive and a key can be bound at most once. A duplicate insert is
/// resolved by reading the existing row: the same URL is treated as an
/// idempotent retry, a different URL is a [`StorageError::Conflict`].
#[derive(Debug, Clone)]
pub struct MySqlUrlStore {
    pool: MySqlPool,
}

impl MySqlUrlStore {
    /// Creates a store from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates a store by opening a new MySQL connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Creates the `short_urls` table if it does not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    async fn fetch_long_url(&self, key: &ShortKey) -> Result<Option<String>> {
        let row = sqlx::query(
            r#"
            SELECT long_url
            FROM short_urls
            WHERE short_key = ?
            LIMIT 1
            "#,
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| {
            warn!(key = %key, operation = "get", error = %err, "MySQL select failed");
            map_sqlx_error(err)
        })?;

        row.map(|row| row.try_get::<String, _>("long_url").map_err(map_sqlx_error))
            .transpose()
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

#[async_trait]
impl UrlStore for MySqlUrlStore {
    async fn put(&self, record: &UrlRecord) -> Result<()> {
        trace!(key = %record.short_key, "Persisting record in MySQL");

        let result = sqlx::query(
            r#"
            INSERT INTO short_urls (short_key, long_url, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(record.short_key.as_str())
        .bind(record.long_url.as_str())
        .bind(Timestamp::now().as_second())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                debug!(key = %record.short_key, "Record persisted");
                Ok(())
            }
            Err(err) if is_unique_violation(&err) => {
                let existing = self.fetch_long_url(&record.short_key).await?;
                match existing {
                    Some(existing_url) if existing_url == record.long_url => {
                        debug!(key = %record.short_key, "Identical record already stored");
                        Ok(())
                    }
                    Some(existing_url) => {
                        warn!(key = %record.short_key, "Short key already bound to another url");
                        Err(StorageError::Conflict {
                            key: record.short_key.to_string(),
                            existing_url,
                        })
                    }
                    // Records are never deleted, so a duplicate always has a row.
                    None => Err(StorageError::InvalidData(format!(
                        "duplicate key '{}' reported but no row found",
                        record.short_key
                    ))),
                }
            }
            Err(err) => {
                warn!(key = %record.short_key, error = %err, "MySQL insert failed");
                Err(map_sqlx_error(err))
            }
        }
    }

    async fn get(&self, key: &ShortKey) -> Result<Option<UrlRecord>> {
        trace!(key = %key, "Fetching record from MySQL");

        Ok(self
            .fetch_long_url(key)
            .await?
            .map(|long_url| UrlRecord::new(key.clone(), long_url)))
    }

    async fn exists(&self, key: &ShortKey) -> Result<bool> {
        let exists = sqlx::query(
            r#"
            SELECT 1
            FROM short_urls
            WHERE short_key = ?
            LIMIT 1
            "#,
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| {
            warn!(key = %key, operation = "exists", error = %err, "MySQL select failed");
            map_sqlx_error(err)
        })?
        .is_some();

        Ok(exists)
    }
}
