use clap::{Parser, ValueEnum};
use keyhole_core::pool::DEFAULT_POOL_NAME;
use keyhole_core::short_key::DEFAULT_KEY_SIZE;
use keyhole_generator::{DEFAULT_IDLE_INTERVAL, DEFAULT_MINIMUM_QUEUE_SIZE};
use keyhole_telemetry::LogFormat;
use std::fmt::{Display, Formatter};

pub const STORE_BACKEND_ENV: &str = "KEYHOLE_STORE_BACKEND";
pub const MYSQL_DSN_ENV: &str = "KEYHOLE_MYSQL_DSN";
pub const REDIS_URL_ENV: &str = "KEYHOLE_REDIS_URL";
pub const POOL_NAME_ENV: &str = "KEYHOLE_POOL_NAME";
pub const SHORT_URL_SIZE_ENV: &str = "KEYHOLE_SHORT_URL_SIZE";
pub const MINIMUM_QUEUE_SIZE_ENV: &str = "KEYHOLE_SHORT_URL_MINIMUM_QUEUE_SIZE";
pub const IDLE_SECS_ENV: &str = "KEYHOLE_GENERATOR_IDLE_SECS";
pub const LOG_FORMAT_ENV: &str = "KEYHOLE_LOG_FORMAT";

pub const DEFAULT_SHORT_URL_SIZE: u8 = DEFAULT_KEY_SIZE as u8;
pub const DEFAULT_IDLE_SECS: u64 = DEFAULT_IDLE_INTERVAL.as_secs();

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

/// Standalone key generator feeding a shared Redis pool.
#[derive(Debug, Parser)]
#[command(name = "keyhole-keygen")]
pub struct CLI {
    #[arg(
        long,
        env = STORE_BACKEND_ENV,
        value_enum,
        default_value_t = StoreBackendArg::Mysql
    )]
    pub store: StoreBackendArg,

    #[arg(long, env = MYSQL_DSN_ENV, required_if_eq("store", "mysql"))]
    pub mysql_dsn: Option<String>,

    #[arg(long, env = REDIS_URL_ENV)]
    pub redis_url: String,

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

    #[arg(long, env = LOG_FORMAT_ENV, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}
