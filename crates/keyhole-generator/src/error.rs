use keyhole_core::short_key::{MAX_KEY_SIZE, MIN_KEY_SIZE};
use keyhole_core::{PoolError, StorageError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GeneratorError>;

/// Failures of the generator. Adapter failures are never swallowed into a
/// "key is free" answer.
#[derive(Debug, Clone, Error)]
pub enum GeneratorError {
    #[error("key size {0} is outside {min}..={max}", min = MIN_KEY_SIZE, max = MAX_KEY_SIZE)]
    InvalidKeySize(usize),
    #[error("store lookup failed: {0}")]
    Storage(#[from] StorageError),
    #[error("pool operation failed: {0}")]
    Pool(#[from] PoolError),
}
