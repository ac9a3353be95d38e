//! Database collaborator lifecycle.
//!
//! The pipeline only needs "connect once at start, then serve": the pool is
//! created before the listener binds and handed to GraphQL resolvers as
//! request data. Schema and queries belong to the business layer.

use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::DatabaseConfig;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Invalid database configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Open the connection pool. Returns `None` when no database URL is
/// configured, in which case the server runs without one.
pub async fn connect(config: &DatabaseConfig) -> Result<Option<PgPool>, DatabaseError> {
    let Some(url) = config.url.as_deref() else {
        warn!("DATABASE_URL not set; running without a database");
        return Ok(None);
    };

    if config.max_connections == 0 {
        return Err(DatabaseError::Config("max_connections must be at least 1".to_string()));
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout))
        .connect(url)
        .await?;

    info!(max_connections = config.max_connections, "Database pool ready");
    Ok(Some(pool))
}

pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_url_runs_without_pool() {
        let config = DatabaseConfig {
            url: None,
            max_connections: 5,
            connection_timeout: 1,
        };
        assert!(connect(&config).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn zero_connections_is_rejected() {
        let config = DatabaseConfig {
            url: Some("postgres://localhost/content".to_string()),
            max_connections: 0,
            connection_timeout: 1,
        };
        assert!(matches!(connect(&config).await, Err(DatabaseError::Config(_))));
    }
}
