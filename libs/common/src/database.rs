//! PostgreSQL connectivity
//!
//! Connection pooling, environment-driven configuration, migrations and a
//! health check for the relational backend.

use std::env;
use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::error::{DatabaseError, DatabaseResult};

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Connection URL; `None` means the application runs without a database
    pub database_url: Option<String>,
    /// Maximum number of pooled connections
    pub max_connections: u32,
    /// How long to wait for a connection before giving up
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    /// Build the configuration from environment variables
    ///
    /// `DATABASE_URL` selects the backend: when unset the caller is expected
    /// to fall back to the in-memory store. `DATABASE_MAX_CONNECTIONS` and
    /// `DATABASE_ACQUIRE_TIMEOUT_SECS` tune the pool.
    pub fn from_env() -> Self {
        let database_url = env::var("DATABASE_URL").ok().filter(|s| !s.is_empty());

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        let acquire_timeout = env::var("DATABASE_ACQUIRE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(10));

        Self {
            database_url,
            max_connections,
            acquire_timeout,
        }
    }
}

/// Initialize a PostgreSQL connection pool from the configuration
///
/// Fails with [`DatabaseError::Configuration`] when no URL is configured.
pub async fn init_pool(config: &DatabaseConfig) -> DatabaseResult<PgPool> {
    let url = config
        .database_url
        .as_deref()
        .ok_or_else(|| DatabaseError::Configuration("DATABASE_URL is not set".to_string()))?;

    let options = url
        .parse()
        .map_err(|e| DatabaseError::Configuration(format!("invalid database URL: {e}")))?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect_with(options)
        .await
        .map_err(DatabaseError::Connection)?;

    info!(
        max_connections = config.max_connections,
        "database pool initialized"
    );

    Ok(pool)
}

/// Run the embedded schema migrations of the given migrator
pub async fn run_migrations(
    pool: &PgPool,
    migrator: &sqlx::migrate::Migrator,
) -> DatabaseResult<()> {
    migrator.run(pool).await.map_err(DatabaseError::Migration)?;
    info!("database migrations applied");
    Ok(())
}

/// Check database connectivity with a trivial query
pub async fn health_check(pool: &PgPool) -> DatabaseResult<bool> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(DatabaseError::Query)?;

    Ok(true)
}
