//! Core types and traits for the Keyhole URL shortener.
//!
//! This crate provides the domain model shared by the key generator, the
//! shortener service and the HTTP gateway, together with the collaborator
//! traits ([`UrlStore`], [`UrlCache`], [`KeyPool`]) that concrete backends
//! implement.

pub mod cache;
pub mod error;
pub mod pool;
pub mod short_key;
pub mod store;

pub use cache::UrlCache;
pub use error::{CacheError, CoreError, PoolError, StorageError};
pub use pool::KeyPool;
pub use short_key::ShortKey;
pub use store::{UrlRecord, UrlStore};
