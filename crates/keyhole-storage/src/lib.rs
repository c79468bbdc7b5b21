//! Durable store backends for short key bindings.

pub mod memory;
pub mod mysql;

pub use keyhole_core::store::Result;
pub use keyhole_core::{StorageError, UrlRecord, UrlStore};
pub use memory::InMemoryUrlStore;
pub use mysql::MySqlUrlStore;
