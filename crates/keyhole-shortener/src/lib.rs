//! URL shortener service implementation.
//!
//! [`UrlShortener`] binds pooled keys to long URLs on the write path and
//! resolves keys cache-first on the read path. Core types are re-exported
//! from `keyhole_core`.

pub mod error;
pub mod service;
pub mod shortener;

pub use error::{Result, ShortenerError};
pub use keyhole_core::{ShortKey, UrlRecord};
pub use service::{ShortenerSettings, UrlShortener};
pub use shortener::Shortener;
