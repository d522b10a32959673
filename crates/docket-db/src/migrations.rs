//! # Database Migrations
//!
//! Embedded Postgres migrations for Docket.
//!
//! ## How Migrations Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Console startup (postgres backend)                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Check _sqlx_migrations table                                          │
//! │       │                                                                 │
//! │       ├── 0001_documents.sql  ✓ documents + unique number index        │
//! │       ├── 0002_catalog.sql    ✓ catalog_items, clauses                 │
//! │       └── 0003_retired_numbers.sql  ⬜ numbers given up on type change  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Run pending migrations in order, record checksums                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Adding New Migrations
//!
//! 1. Add `NNNN_description.sql` under `crates/docket-db/migrations/`
//! 2. **NEVER** modify an applied migration, add a new one instead

use sqlx::PgPool;
use tracing::info;

use crate::error::DbResult;

/// Migrations embedded at compile time from `./migrations`.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Runs all pending migrations. Idempotent.
pub async fn run_migrations(pool: &PgPool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}
