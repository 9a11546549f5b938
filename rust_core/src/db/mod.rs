//! Database connection pooling and health checks.

use anyhow::{Context, Result};
use sqlx::PgPool;

pub mod pool;

pub use pool::{create_pool, DbPoolConfig};

/// Check that the pool can run a trivial query.
pub async fn check_pool_health(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .fetch_one(pool)
        .await
        .context("Database health check failed")?;
    Ok(())
}
