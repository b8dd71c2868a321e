//! PostgreSQL connection pool.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use thiserror::Error;

use crate::config::DatabaseConfig;

/// Errors that can occur with the PostgreSQL pool.
#[derive(Debug, Error)]
pub enum PostgresPoolError {
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Connection unavailable: {0}")]
    ConnectionUnavailable(String),
}

/// PostgreSQL connection pool shared by the template store and health checks.
#[derive(Clone)]
pub struct PostgresPool {
    /// The underlying connection pool
    pool: PgPool,

    /// Database URL (for logging purposes)
    database_url: String,

    /// Configured maximum pool size
    max_connections: u32,
}

impl PostgresPool {
    /// Create a new PostgreSQL pool from configuration.
    pub async fn new(config: &DatabaseConfig) -> Result<Self, PostgresPoolError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds as u64))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds as u64))
            .connect(&config.url)
            .await?;

        let created = Self {
            pool,
            database_url: config.url.clone(),
            max_connections: config.pool_size,
        };

        tracing::info!(
            pool_size = config.pool_size,
            url = %created.database_url_masked(),
            "PostgreSQL connection pool created"
        );

        Ok(created)
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Configured maximum pool size.
    pub fn max_connections(&self) -> u32 {
        self.max_connections
    }

    /// Number of idle connections currently held by the pool.
    pub fn idle_connections(&self) -> u32 {
        self.pool.num_idle() as u32
    }

    /// Round-trip a trivial query to verify connectivity.
    pub async fn health_check(&self) -> Result<(), PostgresPoolError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| PostgresPoolError::ConnectionUnavailable(e.to_string()))
    }

    /// Get the database URL (masked for logging).
    pub fn database_url_masked(&self) -> String {
        mask_database_url(&self.database_url)
    }

    /// Close the pool gracefully.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("PostgreSQL connection pool closed");
    }
}

/// Replace the password component of a connection URL with `***`.
///
/// The userinfo ends at the last `@` before the path, so passwords that
/// contain `@` are masked whole.
fn mask_database_url(url: &str) -> String {
    let authority_start = url.find("://").map(|i| i + 3).unwrap_or(0);
    let authority_end = url[authority_start..]
        .find('/')
        .map(|i| authority_start + i)
        .unwrap_or(url.len());

    let Some(at_pos) = url[authority_start..authority_end].rfind('@') else {
        return url.to_string();
    };
    let at_pos = authority_start + at_pos;

    match url[authority_start..at_pos].find(':') {
        Some(colon) => {
            let colon_pos = authority_start + colon;
            format!("{}***{}", &url[..=colon_pos], &url[at_pos..])
        }
        None => url.to_string(),
    }
}
