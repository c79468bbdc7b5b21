mod cli;

use crate::cli::{StoreBackendArg, CLI};
use anyhow::Context;
use clap::Parser;
use keyhole_core::UrlStore;
use keyhole_generator::{RandomKeyGenerator, ReplenishSettings, ReplenishWorker};
use keyhole_pool::RedisKeyPool;
use keyhole_storage::{InMemoryUrlStore, MySqlUrlStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::try_parse()?;
    keyhole_telemetry::init(config.log_format)?;

    info!(
        store_backend = %config.store,
        pool_name = %config.pool_name,
        short_url_size = config.short_url_size,
        minimum_queue_size = config.minimum_queue_size,
        "starting key generator"
    );

    let store: Arc<dyn UrlStore> = match config.store {
        StoreBackendArg::InMemory => {
            warn!("in-memory store is private to this process, keys are not checked against the shortener's store");
            Arc::new(InMemoryUrlStore::new())
        }
        StoreBackendArg::Mysql => {
            let dsn = config
                .mysql_dsn
                .as_deref()
                .context("mysql dsn is required when store backend is mysql")?;
            let store = MySqlUrlStore::connect(dsn).await?;
            store.migrate().await?;
            Arc::new(store)
        }
    };

    let client = redis::Client::open(config.redis_url.as_str())?;
    let conn = client
        .get_multiplexed_async_connection()
        .await
        .context("failed to connect to redis")?;
    let pool = RedisKeyPool::with_name(conn, config.pool_name);

    let settings = ReplenishSettings::builder()
        .key_size(usize::from(config.short_url_size))
        .minimum_queue_size(config.minimum_queue_size)
        .idle_interval(Duration::from_secs(config.idle_secs))
        .build();
    let worker = ReplenishWorker::new(pool, store, RandomKeyGenerator, settings)
        .context("invalid generator settings")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("received ctrl-c, stopping key generator"),
            Err(e) => warn!(error = %e, "failed to listen for ctrl-c, stopping key generator"),
        }
        let _ = shutdown_tx.send(true);
    });

    let stats = worker.run(shutdown_rx).await;
    info!(
        accepted = stats.accepted,
        rejected = stats.rejected,
        failed = stats.failed,
        "key generator exited"
    );

    Ok(())
}
