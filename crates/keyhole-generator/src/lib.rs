//! Background production of unused short keys.
//!
//! [`RandomKeyGenerator`] mints candidates, [`KeyReplenisher`] admits the
//! ones the store has never bound into the pool, and [`ReplenishWorker`]
//! drives the replenisher against a watermark until it is told to stop.

pub mod error;
pub mod random;
pub mod replenish;
pub mod worker;

pub use error::{GeneratorError, Result};
pub use random::{KeyGenerator, RandomKeyGenerator};
pub use replenish::KeyReplenisher;
pub use worker::{
    ReplenishSettings, ReplenishStats, ReplenishWorker, DEFAULT_ERROR_BACKOFF,
    DEFAULT_IDLE_INTERVAL, DEFAULT_MINIMUM_QUEUE_SIZE,
};
