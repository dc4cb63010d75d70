//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::time::Duration;

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,

    /// PostgreSQL host
    pub db_host: String,
    /// PostgreSQL port
    pub db_port: u16,
    /// PostgreSQL user
    pub db_user: String,
    /// PostgreSQL password
    pub db_password: String,
    /// PostgreSQL database name
    pub db_name: String,
    /// Maximum connections in the pool
    pub db_pool_size: usize,

    /// Total cache capacity across all shards
    pub cache_capacity: usize,
    /// Number of cache shards
    pub cache_shards: usize,
    /// Entry time-to-live
    pub cache_ttl: Duration,

    /// Bounded capacity of the in-process order stream
    pub stream_capacity: usize,
    /// How long a fetched-but-uncommitted message waits before redelivery
    pub stream_redelivery_delay: Duration,
    /// Pause after a failed persist before fetching the next message
    pub ingest_retry_backoff: Duration,

    /// How long in-flight work may finish after a shutdown signal
    pub shutdown_timeout: Duration,
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `HTTP_PORT` - HTTP server port (default: 8081)
    /// - `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD`, `DB_NAME` - PostgreSQL connection
    /// - `DB_POOL_SIZE` - connection pool size (default: 16)
    /// - `CACHE_CAPACITY` - total cache slots (default: 1000)
    /// - `CACHE_SHARDS` - shard count (default: 16)
    /// - `CACHE_TTL_SEC` - entry TTL in seconds (default: 600)
    /// - `STREAM_CAPACITY` - in-process stream depth (default: 1024)
    /// - `STREAM_REDELIVERY_SEC` - uncommitted message redelivery delay (default: 5)
    /// - `INGEST_RETRY_BACKOFF_MS` - persist-failure backoff (default: 300)
    /// - `SHUTDOWN_TIMEOUT_SEC` - in-flight work deadline on shutdown (default: 10)
    pub fn from_env() -> Self {
        Self {
            server_port: env_parsed("HTTP_PORT", 8081),

            db_host: env_string("DB_HOST", "localhost"),
            db_port: env_parsed("DB_PORT", 5432),
            db_user: env_string("DB_USER", "postgres"),
            db_password: env_string("DB_PASSWORD", ""),
            db_name: env_string("DB_NAME", "orders"),
            db_pool_size: env_parsed("DB_POOL_SIZE", 16),

            cache_capacity: env_parsed("CACHE_CAPACITY", 1000),
            cache_shards: env_parsed("CACHE_SHARDS", 16),
            cache_ttl: Duration::from_secs(env_parsed("CACHE_TTL_SEC", 600)),

            stream_capacity: env_parsed("STREAM_CAPACITY", 1024),
            stream_redelivery_delay: Duration::from_secs(env_parsed("STREAM_REDELIVERY_SEC", 5)),
            ingest_retry_backoff: Duration::from_millis(env_parsed("INGEST_RETRY_BACKOFF_MS", 300)),

            shutdown_timeout: Duration::from_secs(env_parsed("SHUTDOWN_TIMEOUT_SEC", 10)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8081,
            db_host: "localhost".to_string(),
            db_port: 5432,
            db_user: "postgres".to_string(),
            db_password: String::new(),
            db_name: "orders".to_string(),
            db_pool_size: 16,
            cache_capacity: 1000,
            cache_shards: 16,
            cache_ttl: Duration::from_secs(600),
            stream_capacity: 1024,
            stream_redelivery_delay: Duration::from_secs(5),
            ingest_retry_backoff: Duration::from_millis(300),
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}
