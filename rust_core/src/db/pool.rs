//! Database pool configuration
//!
//! Ingest runs are sequential, so the pool is small and short-lived.

use anyhow::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Database pool configuration
#[derive(Clone, Debug)]
pub struct DbPoolConfig {
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of idle connections to maintain
    pub min_connections: u32,
    /// Maximum lifetime of a connection
    pub max_lifetime: Duration,
    /// Maximum idle time before a connection is closed
    pub idle_timeout: Duration,
    /// Connection timeout
    pub acquire_timeout: Duration,
}

impl Default for DbPoolConfig {
    fn default() -> Self {
        Self::sequential()
    }
}

impl DbPoolConfig {
    /// One writer at a time, as every pipeline runs.
    pub fn sequential() -> Self {
        Self {
            max_connections: 2,
            min_connections: 1,
            max_lifetime: Duration::from_secs(1800),
            idle_timeout: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(30),
        }
    }

    /// Load configuration from environment variables, falling back to [`Self::sequential`]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the `DB_POOL_*` keys through `lookup`; unset or unparsable keys keep the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::sequential();
        let num = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());
        Self {
            max_connections: num("DB_POOL_MAX_CONNECTIONS")
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(defaults.max_connections),
            min_connections: num("DB_POOL_MIN_CONNECTIONS")
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(defaults.min_connections),
            max_lifetime: num("DB_POOL_MAX_LIFETIME_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.max_lifetime),
            idle_timeout: num("DB_POOL_IDLE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.idle_timeout),
            acquire_timeout: num("DB_POOL_ACQUIRE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.acquire_timeout),
        }
    }
}

/// Create a PostgreSQL connection pool
pub async fn create_pool(database_url: &str, config: DbPoolConfig) -> Result<PgPool> {
    info!(
        "Creating database pool: max={}, min={}, acquire_timeout={:?}",
        config.max_connections, config.min_connections, config.acquire_timeout
    );

    let connect_opts = PgConnectOptions::from_str(database_url)
        .context("Failed to parse database URL")?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections.min(config.max_connections))
        .max_lifetime(config.max_lifetime)
        .idle_timeout(config.idle_timeout)
        .acquire_timeout(config.acquire_timeout)
        .connect_with(connect_opts)
        .await
        .context("Failed to create database pool")?;

    info!("Database pool created successfully");
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_config() {
        let config = DbPoolConfig::sequential();
        assert_eq!(config.max_connections, 2);
        assert_eq!(config.min_connections, 1);
        assert!(config.min_connections <= config.max_connections);
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = DbPoolConfig::from_lookup(|key| match key {
            "DB_POOL_MAX_CONNECTIONS" => Some("8".to_string()),
            "DB_POOL_ACQUIRE_TIMEOUT_SECS" => Some("5".to_string()),
            "DB_POOL_MIN_CONNECTIONS" => Some("lots".to_string()),
            _ => None,
        });
        assert_eq!(config.max_connections, 8);
        assert_eq!(config.acquire_timeout, Duration::from_secs(5));
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.idle_timeout, Duration::from_secs(600));
    }

    #[test]
    fn test_default_is_sequential() {
        let config = DbPoolConfig::default();
        assert_eq!(config.acquire_timeout, Duration::from_secs(30));
    }
}
