//! Fast cache backends sitting in front of the durable store.

pub mod moka;
pub mod redis;

pub use keyhole_core::cache::{Result, DEFAULT_CACHE_TTL};
pub use keyhole_core::{CacheError, UrlCache};
pub use crate::moka::MokaUrlCache;
pub use crate::redis::RedisUrlCache;
