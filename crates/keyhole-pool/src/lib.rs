//! Backends for the pool of available short keys.
//!
//! The key generator pushes verified-unused keys into a [`KeyPool`] and the
//! shortener pops one per shortening request. Both backends here push on
//! the left and pop on the right, so keys are handed out oldest first.

pub mod memory;
pub mod redis;

pub use crate::memory::InMemoryKeyPool;
pub use crate::redis::RedisKeyPool;
pub use keyhole_core::pool::{Result, DEFAULT_POOL_NAME};
pub use keyhole_core::{KeyPool, PoolError};
