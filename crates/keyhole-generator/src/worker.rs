use crate::error::{GeneratorError, Result};
use crate::random::KeyGenerator;
use crate::replenish::KeyReplenisher;
use keyhole_core::short_key::{DEFAULT_KEY_SIZE, MAX_KEY_SIZE, MIN_KEY_SIZE};
use keyhole_core::{KeyPool, UrlStore};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use typed_builder::TypedBuilder;

/// Pool size at or below which the worker keeps generating.
pub const DEFAULT_MINIMUM_QUEUE_SIZE: usize = 5;
/// Sleep between size polls once the pool is above the watermark.
pub const DEFAULT_IDLE_INTERVAL: Duration = Duration::from_secs(5);
/// Sleep after a failed iteration.
pub const DEFAULT_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Configures a [`ReplenishWorker`].
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct ReplenishSettings {
    /// Length of minted keys, in `1..=32`.
    #[builder(default = DEFAULT_KEY_SIZE)]
    pub key_size: usize,
    /// The watermark. The worker generates while the pool holds this many
    /// keys or fewer, so a settled pool holds one more.
    #[builder(default = DEFAULT_MINIMUM_QUEUE_SIZE)]
    pub minimum_queue_size: usize,
    #[builder(default = DEFAULT_IDLE_INTERVAL)]
    pub idle_interval: Duration,
    #[builder(default = DEFAULT_ERROR_BACKOFF)]
    pub error_backoff: Duration,
}

impl Default for ReplenishSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Counters reported by [`ReplenishWorker::run`] when it stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplenishStats {
    /// Candidates pushed into the pool.
    pub accepted: u64,
    /// Candidates discarded because the store already bound them.
    pub rejected: u64,
    /// Iterations that ended in an adapter error.
    pub failed: u64,
}

enum Step {
    Accepted,
    Rejected,
    Idle(usize),
}

/// Background loop keeping the pool above its watermark.
pub struct ReplenishWorker<P, S, G> {
    replenisher: KeyReplenisher<P, S, G>,
    settings: ReplenishSettings,
}

impl<P: KeyPool, S: UrlStore, G: KeyGenerator> ReplenishWorker<P, S, G> {
    /// Fails with [`GeneratorError::InvalidKeySize`] when the configured key
    /// size could not produce valid keys.
    pub fn new(pool: P, store: S, generator: G, settings: ReplenishSettings) -> Result<Self> {
        if !(MIN_KEY_SIZE..=MAX_KEY_SIZE).contains(&settings.key_size) {
            return Err(GeneratorError::InvalidKeySize(settings.key_size));
        }

        Ok(Self {
            replenisher: KeyReplenisher::new(pool, store, generator, settings.key_size),
            settings,
        })
    }

    /// Runs until `shutdown` carries `true` or its sender is dropped.
    ///
    /// The signal is observed between iterations and interrupts the idle and
    /// backoff sleeps. An iteration that has started always completes, so a
    /// key is never lost between the store check and the push.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> ReplenishStats {
        let mut stats = ReplenishStats::default();
        info!(
            key_size = self.settings.key_size,
            minimum_queue_size = self.settings.minimum_queue_size,
            idle_interval_ms = self.settings.idle_interval.as_millis() as u64,
            "Key replenisher started"
        );

        while !stop_requested(&shutdown) {
            let pause = match self.step().await {
                Ok(Step::Accepted) => {
                    stats.accepted += 1;
                    None
                }
                Ok(Step::Rejected) => {
                    stats.rejected += 1;
                    None
                }
                Ok(Step::Idle(size)) => {
                    debug!(pool_size = size, "Pool above watermark, idling");
                    Some(self.settings.idle_interval)
                }
                Err(e) => {
                    stats.failed += 1;
                    warn!(
                        error = %e,
                        backoff_ms = self.settings.error_backoff.as_millis() as u64,
                        "Replenish iteration failed, backing off"
                    );
                    Some(self.settings.error_backoff)
                }
            };

            if let Some(duration) = pause {
                if sleep_or_stop(&mut shutdown, duration).await {
                    break;
                }
            }
        }

        info!(
            accepted = stats.accepted,
            rejected = stats.rejected,
            failed = stats.failed,
            "Key replenisher stopped"
        );
        stats
    }

    async fn step(&self) -> Result<Step> {
        let size = self.replenisher.pool_size().await?;
        if size > self.settings.minimum_queue_size {
            return Ok(Step::Idle(size));
        }

        if self.replenisher.generate_and_enqueue().await? {
            Ok(Step::Accepted)
        } else {
            Ok(Step::Rejected)
        }
    }
}

fn stop_requested(shutdown: &watch::Receiver<bool>) -> bool {
    *shutdown.borrow() || shutdown.has_changed().is_err()
}

/// Returns `true` if the stop signal fired before `duration` elapsed.
async fn sleep_or_stop(shutdown: &mut watch::Receiver<bool>, duration: Duration) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(duration) => false,
        changed = shutdown.changed() => changed.is_err() || *shutdown.borrow(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::RandomKeyGenerator;
    use async_trait::async_trait;
    use keyhole_core::{ShortKey, StorageError, UrlRecord};
    use keyhole_pool::InMemoryKeyPool;
    use keyhole_storage::InMemoryUrlStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct FlakyStore {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl UrlStore for FlakyStore {
        async fn put(&self, _record: &UrlRecord) -> keyhole_core::store::Result<()> {
            Err(StorageError::Timeout("put".into()))
        }

        async fn get(&self, _key: &ShortKey) -> keyhole_core::store::Result<Option<UrlRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StorageError::Timeout("get".into()))
        }
    }

    async fn pool_reaches(pool: &InMemoryKeyPool, size: usize) {
        awaitility::at_most(Duration::from_secs(5))
            .poll_interval(Duration::from_millis(5))
            .until_async(|| async { pool.len() == size })
            .await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn fills_pool_to_watermark_plus_one() {
        let pool = InMemoryKeyPool::new();
        let settings = ReplenishSettings::builder()
            .minimum_queue_size(5)
            .idle_interval(Duration::from_millis(10))
            .build();
        let worker = ReplenishWorker::new(
            pool.clone(),
            InMemoryUrlStore::new(),
            RandomKeyGenerator,
            settings,
        )
        .unwrap();
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(worker.run(rx));

        pool_reaches(&pool, 6).await;
        // A few idle rounds must not overshoot.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(pool.current_size().await.unwrap(), 6);

        tx.send(true).unwrap();
        let stats = handle.await.unwrap();
        assert_eq!(stats.accepted, 6);
        assert_eq!(stats.failed, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn refills_after_consumption() {
        let pool = InMemoryKeyPool::new();
        let settings = ReplenishSettings::builder()
            .minimum_queue_size(2)
            .idle_interval(Duration::from_millis(10))
            .build();
        let worker = ReplenishWorker::new(
            pool.clone(),
            InMemoryUrlStore::new(),
            RandomKeyGenerator,
            settings,
        )
        .unwrap();
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(worker.run(rx));

        pool_reaches(&pool, 3).await;
        for _ in 0..3 {
            pool.dequeue().await.unwrap();
        }
        pool_reaches(&pool, 3).await;

        tx.send(true).unwrap();
        let stats = handle.await.unwrap();
        assert_eq!(stats.accepted, 6);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn stop_signal_interrupts_idle_sleep() {
        let pool = InMemoryKeyPool::new();
        let settings = ReplenishSettings::builder()
            .minimum_queue_size(0)
            .idle_interval(Duration::from_secs(3600))
            .build();
        let worker = ReplenishWorker::new(
            pool.clone(),
            InMemoryUrlStore::new(),
            RandomKeyGenerator,
            settings,
        )
        .unwrap();
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(worker.run(rx));

        pool_reaches(&pool, 1).await;
        tx.send(true).unwrap();

        let stats = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("worker did not stop")
            .unwrap();
        assert_eq!(stats.accepted, 1);
    }

    #[tokio::test]
    async fn dropped_sender_stops_worker() {
        let worker = ReplenishWorker::new(
            InMemoryKeyPool::new(),
            InMemoryUrlStore::new(),
            RandomKeyGenerator,
            ReplenishSettings::builder()
                .idle_interval(Duration::from_secs(3600))
                .build(),
        )
        .unwrap();
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(worker.run(rx));
        drop(tx);

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("worker did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn already_stopped_worker_does_nothing() {
        let pool = InMemoryKeyPool::new();
        let worker = ReplenishWorker::new(
            pool.clone(),
            InMemoryUrlStore::new(),
            RandomKeyGenerator,
            ReplenishSettings::default(),
        )
        .unwrap();
        let (_tx, rx) = watch::channel(true);

        let stats = worker.run(rx).await;
        assert_eq!(stats, ReplenishStats::default());
        assert_eq!(pool.current_size().await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn backs_off_on_store_errors() {
        let store = Arc::new(FlakyStore::default());
        let pool = InMemoryKeyPool::new();
        let settings = ReplenishSettings::builder()
            .error_backoff(Duration::from_secs(3600))
            .build();
        let worker =
            ReplenishWorker::new(pool.clone(), store.clone(), RandomKeyGenerator, settings).unwrap();
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(worker.run(rx));

        awaitility::at_most(Duration::from_secs(5))
            .poll_interval(Duration::from_millis(5))
            .until_async(|| async { store.calls.load(Ordering::SeqCst) >= 1 })
            .await;
        // The hour-long backoff means no second attempt happens before stop.
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();

        let stats = handle.await.unwrap();
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.accepted, 0);
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
        assert_eq!(pool.current_size().await.unwrap(), 0);
    }

    #[test]
    fn rejects_key_sizes_that_cannot_form_keys() {
        for key_size in [0, 33] {
            let settings = ReplenishSettings::builder().key_size(key_size).build();
            let result = ReplenishWorker::new(
                InMemoryKeyPool::new(),
                InMemoryUrlStore::new(),
                RandomKeyGenerator,
                settings,
            );
            assert!(
                matches!(result, Err(GeneratorError::InvalidKeySize(size)) if size == key_size),
                "{key_size}"
            );
        }

        for key_size in [1, 32] {
            let settings = ReplenishSettings::builder().key_size(key_size).build();
            assert!(ReplenishWorker::new(
                InMemoryKeyPool::new(),
                InMemoryUrlStore::new(),
                RandomKeyGenerator,
                settings,
            )
            .is_ok());
        }
    }
}
