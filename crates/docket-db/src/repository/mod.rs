//! # Postgres Repositories
//!
//! Gateway implementations over the relational store.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DocumentService                                                       │
//! │       │  gateway.save(&record)                                         │
//! │       ▼                                                                 │
//! │  PgDocumentStore                                                       │
//! │  ├── save         INSERT .. ON CONFLICT (id) DO UPDATE .. RETURNING    │
//! │  ├── get_by_id    SELECT .. WHERE id = $1                              │
//! │  └── list_by_type SELECT .. WHERE record_type = $1                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DocumentRow ──adapter──► DocumentRecord                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - [`PgDocumentStore`] - Document upsert and lookup
//! - [`PgCatalog`] - Catalog items and clauses

pub mod catalog;
pub mod document;

pub use catalog::PgCatalog;
pub use document::PgDocumentStore;
