use clap::{Parser, ValueEnum};
use keyhole_core::cache::DEFAULT_CACHE_TTL;
use keyhole_core::pool::DEFAULT_POOL_NAME;
use keyhole_core::short_key::DEFAULT_KEY_SIZE;
use keyhole_generator::{DEFAULT_IDLE_INTERVAL, DEFAULT_MINIMUM_QUEUE_SIZE};
use keyhole_telemetry::LogFormat;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;

pub const LISTEN_ADDR_ENV: &str = "KEYHOLE_LISTEN_ADDR";
pub const STORE_BACKEND_ENV: &str = "KEYHOLE_STORE_BACKEND";
pub const MYSQL_DSN_ENV: &str = "KEYHOLE_MYSQL_DSN";
pub const CACHE_BACKEND_ENV: &str = "KEYHOLE_CACHE_BACKEND";
pub const POOL_BACKEND_ENV: &str = "KEYHOLE_POOL_BACKEND";
pub const REDIS_URL_ENV: &str = "KEYHOLE_REDIS_URL";
pub const POOL_NAME_ENV: &str = "KEYHOLE_POOL_NAME";
pub const SHORT_URL_SIZE_ENV: &str = "KEYHOLE_SHORT_URL_SIZE";
pub const MINIMUM_QUEUE_SIZE_ENV: &str = "KEYHOLE_SHORT_URL_MINIMUM_QUEUE_SIZE";
pub const IDLE_SECS_ENV: &str = "KEYHOLE_GENERATOR_IDLE_SECS";
pub const CACHE_TTL_SECS_ENV: &str = "KEYHOLE_CACHE_TTL_SECS";
pub const EMBEDDED_GENERATOR_ENV: &str = "KEYHOLE_EMBEDDED_GENERATOR";
pub const ALLOWED_ORIGINS_ENV: &str = "KEYHOLE_ALLOWED_ORIGINS";
pub const LOG_FORMAT_ENV: &str = "KEYHOLE_LOG_FORMAT";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_SHORT_URL_SIZE: u8 = DEFAULT_KEY_SIZE as u8;
pub const DEFAULT_IDLE_SECS: u64 = DEFAULT_IDLE_INTERVAL.as_secs();
pub const DEFAULT_CACHE_TTL_SECS: u64 = DEFAULT_CACHE_TTL.as_secs();
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:5000,http://127.0.0.1:5000";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "mysql")]
    Mysql,
}

impl Display for StoreBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackendArg::InMemory => write!(f, "in-memory"),
            StoreBackendArg::Mysql => write!(f, "mysql"),
        }
    }
}

/// Backend choice shared by the cache and the key pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RedisBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "redis")]
    Redis,
}

impl Display for RedisBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RedisBackendArg::InMemory => write!(f, "in-memory"),
            RedisBackendArg::Redis => write!(f, "redis"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "keyhole-gateway")]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    #[arg(
        long,
        env = STORE_BACKEND_ENV,
        value_enum,
        default_value_t = StoreBackendArg::InMemory
    )]
    pub store: StoreBackendArg,

    #[arg(long, env = MYSQL_DSN_ENV, required_if_eq("store", "mysql"))]
    pub mysql_dsn: Option<String>,

    #[arg(
        long,
        env = CACHE_BACKEND_ENV,
        value_enum,
        default_value_t = RedisBackendArg::InMemory
    )]
    pub cache: RedisBackendArg,

    #[arg(
        long,
        env = POOL_BACKEND_ENV,
        value_enum,
        default_value_t = RedisBackendArg::InMemory
    )]
    pub pool: RedisBackendArg,

    #[arg(
        long,
        env = REDIS_URL_ENV,
        required_if_eq("cache", "redis"),
        required_if_eq("pool", "redis")
    )]
    pub redis_url: Option<String>,

    #[arg(long, env = POOL_NAME_ENV, default_value = DEFAULT_POOL_NAME)]
    pub pool_name: String,

    #[arg(
        long,
        env = SHORT_URL_SIZE_ENV,
        default_value_t = DEFAULT_SHORT_URL_SIZE,
        value_parser = clap::value_parser!(u8).range(1..=32)
    )]
    pub short_url_size: u8,

    #[arg(long, env = MINIMUM_QUEUE_SIZE_ENV, default_value_t = DEFAULT_MINIMUM_QUEUE_SIZE)]
    pub minimum_queue_size: usize,

    #[arg(long, env = IDLE_SECS_ENV, default_value_t = DEFAULT_IDLE_SECS)]
    pub idle_secs: u64,

    #[arg(long, env = CACHE_TTL_SECS_ENV, default_value_t = DEFAULT_CACHE_TTL_SECS)]
    pub cache_ttl_secs: u64,

    /// Run the key generator inside the gateway. Defaults to on for the
    /// in-memory pool, which no other process can fill.
    #[arg(long, env = EMBEDDED_GENERATOR_ENV)]
    pub embedded_generator: Option<bool>,

    #[arg(
        long,
        env = ALLOWED_ORIGINS_ENV,
        value_delimiter = ',',
        default_value = DEFAULT_ALLOWED_ORIGINS
    )]
    pub allowed_origins: Vec<String>,

    #[arg(long, env = LOG_FORMAT_ENV, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl CLI {
    pub fn embedded_generator(&self) -> bool {
        self.embedded_generator
            .unwrap_or(self.pool == RedisBackendArg::InMemory)
    }
}
