//! # docket-db: Persistence Gateway for Docket
//!
//! Stores and loads documents and reads the shared service/test and clause
//! catalogs. Three backends sit behind the same gateway traits.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Docket Data Flow                               │
//! │                                                                         │
//! │  Console command (save / list / show)                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     docket-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Gateways    │    │   Backends    │    │   Adapter    │  │   │
//! │  │   │ (gateway.rs)  │    │               │    │ (adapter.rs) │  │   │
//! │  │   │               │    │ PgDocument-   │    │              │  │   │
//! │  │   │ Document-     │◄───│   Store       │───►│ stored shape │  │   │
//! │  │   │   Gateway     │    │ KvDocument-   │    │      ↕       │  │   │
//! │  │   │ Catalog-      │    │   Store       │    │ Document-    │  │   │
//! │  │   │   Gateway     │    │ MemoryStore   │    │   Record     │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                   │                             │
//! │       ▼                                   ▼                             │
//! │  ┌──────────────────────────┐   ┌──────────────────────────────┐       │
//! │  │ PostgreSQL (documents,   │   │ Redis (docket:record:*,      │       │
//! │  │ catalog_items, clauses)  │   │ docket:number:* claims)      │       │
//! │  └──────────────────────────┘   └──────────────────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`gateway`] - `DocumentGateway` and `CatalogGateway` traits
//! - [`pool`] - Postgres pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`repository`] - Postgres gateway implementations
//! - [`kv`] - Redis document store
//! - [`memory`] - In-memory store
//! - [`adapter`] - Stored shapes (current and older) to domain records
//! - [`error`] - Database error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use docket_db::{Database, DbConfig, DocumentGateway};
//!
//! let db = Database::new(DbConfig::new("postgres://docket@localhost/docket")).await?;
//! let documents = db.documents();
//! let all = documents.list_by_type(docket_core::ACCOUNT_RECORD_TYPE).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod adapter;
pub mod error;
pub mod gateway;
pub mod kv;
pub mod memory;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use gateway::{CatalogGateway, DocumentGateway};
pub use kv::KvDocumentStore;
pub use memory::MemoryStore;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::catalog::PgCatalog;
pub use repository::document::PgDocumentStore;
