//! # Postgres Pool
//!
//! One pool is shared by the document store and the catalog.
//!
//! ```text
//! DbConfig::new(url) ──► Database::new ──► migrations (unless disabled)
//!                              │
//!                              ├──► documents() → PgDocumentStore
//!                              └──► catalog()   → PgCatalog
//! ```

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::catalog::PgCatalog;
use crate::repository::document::PgDocumentStore;

/// Pool settings. Built from the `[storage]` section of the console config.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// How long a query waits for a free connection.
    pub acquire_timeout: Duration,
    pub run_migrations: bool,
}

impl DbConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        DbConfig {
            database_url: database_url.into(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max.max(1);
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }
}

/// Owns the pool and hands out the Postgres gateways.
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(max_connections = config.max_connections, "Connecting to Postgres");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.database_url)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        if config.run_migrations {
            migrations::run_migrations(&pool).await?;
        } else {
            debug!("Migrations disabled; assuming schema is current");
        }

        Ok(Database { pool })
    }

    pub fn documents(&self) -> PgDocumentStore {
        PgDocumentStore::new(self.pool.clone())
    }

    pub fn catalog(&self) -> PgCatalog {
        PgCatalog::new(self.pool.clone())
    }

    pub async fn close(&self) {
        debug!("Closing Postgres pool");
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides_defaults() {
        let config = DbConfig::new("postgres://localhost/docket")
            .max_connections(12)
            .acquire_timeout(Duration::from_secs(3))
            .run_migrations(false);

        assert_eq!(config.max_connections, 12);
        assert_eq!(config.acquire_timeout, Duration::from_secs(3));
        assert!(!config.run_migrations);
    }

    #[test]
    fn test_zero_connections_clamped() {
        let config = DbConfig::new("postgres://localhost/docket").max_connections(0);
        assert_eq!(config.max_connections, 1);
        assert!(config.run_migrations);
    }
}
