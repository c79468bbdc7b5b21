mod cli;

use crate::cli::{RedisBackendArg, StoreBackendArg, CLI};
use anyhow::Context;
use clap::Parser;
use keyhole_cache::{MokaUrlCache, RedisUrlCache};
use keyhole_core::{KeyPool, UrlCache, UrlStore};
use keyhole_gateway::{App, AppState};
use keyhole_generator::{RandomKeyGenerator, ReplenishSettings, ReplenishWorker};
use keyhole_pool::{InMemoryKeyPool, RedisKeyPool};
use keyhole_shortener::{ShortenerSettings, UrlShortener};
use keyhole_storage::{InMemoryUrlStore, MySqlUrlStore};
use redis::aio::MultiplexedConnection;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::try_parse()?;
    keyhole_telemetry::init(config.log_format)?;

    let embedded_generator = config.embedded_generator();
    info!(
        listen_addr = %config.listen_addr,
        store_backend = %config.store,
        cache_backend = %config.cache,
        pool_backend = %config.pool,
        pool_name = %config.pool_name,
        embedded_generator,
        "starting gateway server"
    );

    let store: Arc<dyn UrlStore> = match config.store {
        StoreBackendArg::InMemory => Arc::new(InMemoryUrlStore::new()),
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

    let redis = match (&config.redis_url, config.cache, config.pool) {
        (_, RedisBackendArg::InMemory, RedisBackendArg::InMemory) => None,
        (Some(url), _, _) => Some(connect_redis(url).await?),
        (None, _, _) => anyhow::bail!("redis url is required when a redis backend is selected"),
    };

    let cache: Arc<dyn UrlCache> = match (config.cache, &redis) {
        (RedisBackendArg::Redis, Some(conn)) => Arc::new(RedisUrlCache::new(conn.clone())),
        _ => Arc::new(MokaUrlCache::new()),
    };

    let pool: Arc<dyn KeyPool> = match (config.pool, &redis) {
        (RedisBackendArg::Redis, Some(conn)) => {
            Arc::new(RedisKeyPool::with_name(conn.clone(), config.pool_name.clone()))
        }
        _ => Arc::new(InMemoryKeyPool::with_name(config.pool_name.clone())),
    };

    if !embedded_generator && config.pool == RedisBackendArg::InMemory {
        warn!("in-memory pool without embedded generator will never be filled");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let generator = if embedded_generator {
        let settings = ReplenishSettings::builder()
            .key_size(usize::from(config.short_url_size))
            .minimum_queue_size(config.minimum_queue_size)
            .idle_interval(Duration::from_secs(config.idle_secs))
            .build();
        let worker = ReplenishWorker::new(pool.clone(), store.clone(), RandomKeyGenerator, settings)
            .context("invalid generator settings")?;
        Some(tokio::spawn(worker.run(shutdown_rx.clone())))
    } else {
        None
    };

    let shortener = UrlShortener::with_settings(
        pool,
        store,
        cache,
        ShortenerSettings::builder()
            .cache_ttl(Duration::from_secs(config.cache_ttl_secs))
            .build(),
    );

    let router = App::router(AppState::new(Arc::new(shortener)))
        .layer(App::cors(&config.allowed_origins).context("invalid allowed origin")?);

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!(listen_addr = %listener.local_addr()?, "gateway listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(wait_for_shutdown(shutdown_tx))
        .await?;

    if let Some(handle) = generator {
        match handle.await {
            Ok(stats) => info!(
                accepted = stats.accepted,
                rejected = stats.rejected,
                failed = stats.failed,
                "embedded key generator exited"
            ),
            Err(e) => warn!(error = %e, "embedded key generator task failed"),
        }
    }

    info!("gateway stopped");
    Ok(())
}

async fn connect_redis(url: &str) -> anyhow::Result<MultiplexedConnection> {
    let client = redis::Client::open(url)?;
    client
        .get_multiplexed_async_connection()
        .await
        .context("failed to connect to redis")
}

async fn wait_for_shutdown(shutdown_tx: watch::Sender<bool>) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received ctrl-c, shutting down"),
        Err(e) => warn!(error = %e, "failed to listen for ctrl-c, shutting down"),
    }
    let _ = shutdown_tx.send(true);
}
