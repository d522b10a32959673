//! # Gateway Traits
//!
//! The storage contract the save service and the CLI depend on. Each
//! backend (Postgres, Redis, memory) implements both traits or just the
//! document half.
//!
//! ```text
//! ┌────────────────────┐      ┌──────────────────────────────────────────┐
//! │  DocumentService   │─────►│ dyn DocumentGateway                      │
//! │  (apps/console)    │      │   save · get_by_id · list_by_type        │
//! └────────────────────┘      │   retired_numbers · health_check         │
//!                             ├──────────────────────────────────────────┤
//!                             │ PgDocumentStore │ KvDocumentStore │ Memory│
//!                             └──────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use docket_core::{CatalogItem, ClauseEntry, ClauseKind, DocumentRecord, IssuedNumber, ItemKind};

use crate::error::DbResult;

/// Document persistence.
#[async_trait]
pub trait DocumentGateway: Send + Sync {
    /// Upserts by id and returns the stored record.
    ///
    /// `created_at` is assigned on first insert and never changed after;
    /// `updated_at` is refreshed on every save. A document number already
    /// held or retired by another record fails with `DbError::UniqueViolation`.
    /// When the record's number changes, the old one is retired.
    async fn save(&self, record: &DocumentRecord) -> DbResult<DocumentRecord>;

    async fn get_by_id(&self, id: &str) -> DbResult<Option<DocumentRecord>>;

    /// Every record of a record type (`"account"` for documents), oldest first.
    async fn list_by_type(&self, record_type: &str) -> DbResult<Vec<DocumentRecord>>;

    /// Numbers a record gave up when it took a new one (type change).
    ///
    /// A retired number stays reserved for the record that held it, and the
    /// allocator counts it so the sequence never hands it out again.
    async fn retired_numbers(&self) -> DbResult<Vec<IssuedNumber>>;

    async fn health_check(&self) -> DbResult<()>;

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;
}

/// Read-only access to the shared service/test and clause catalogs.
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    /// Active catalog entries of one kind.
    async fn catalog_items(&self, kind: ItemKind) -> DbResult<Vec<CatalogItem>>;

    /// Clauses of one kind in catalog order.
    async fn clauses(&self, kind: ClauseKind) -> DbResult<Vec<ClauseEntry>>;
}
