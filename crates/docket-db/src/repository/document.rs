//! # Document Repository
//!
//! Postgres implementation of [`DocumentGateway`].
//!
//! `created_at` comes from the column default on first insert and is left
//! untouched by the `ON CONFLICT` branch, so the server owns it. The partial
//! unique index on `document_number` rejects a second record minting the
//! same number.
//!
//! ## Retired Numbers
//! ```text
//! save(record) ── one transaction ──────────────────────────────────────────
//!   1. lock the existing row (FOR UPDATE)
//!   2. number retired by another document?  ──► UniqueViolation
//!   3. upsert documents
//!   4. number changed?  old number ──► retired_numbers
//! ```

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{debug, warn};

use docket_core::{DocumentRecord, DocumentType, IssuedNumber};

use crate::adapter::{document_type_key, DocumentRow};
use crate::error::{DbError, DbResult, NUMBER_FIELD};
use crate::gateway::DocumentGateway;

const SELECT_COLUMNS: &str = r#"
    id, record_type, document_type, document_number, client_name,
    content, created_by, created_at, updated_at
"#;

/// Repository for the `documents` table.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        PgDocumentStore { pool }
    }

    fn map_write_error(err: sqlx::Error, record: &DocumentRecord) -> DbError {
        match DbError::from(err) {
            DbError::UniqueViolation { .. } => DbError::duplicate(
                NUMBER_FIELD,
                record.document_number.clone().unwrap_or_default(),
            ),
            other => other,
        }
    }
}

#[async_trait]
impl DocumentGateway for PgDocumentStore {
    async fn save(&self, record: &DocumentRecord) -> DbResult<DocumentRecord> {
        debug!(
            id = %record.id,
            number = ?record.document_number,
            "Upserting document"
        );

        let sql = format!(
            r#"
            INSERT INTO documents (
                id, record_type, document_type, document_number,
                client_name, content, created_by
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                record_type = EXCLUDED.record_type,
                document_type = EXCLUDED.document_type,
                document_number = EXCLUDED.document_number,
                client_name = EXCLUDED.client_name,
                content = EXCLUDED.content,
                updated_at = NOW()
            RETURNING {}
            "#,
            SELECT_COLUMNS
        );

        let mut tx = self.pool.begin().await?;

        let previous: Option<(String, Option<String>)> = sqlx::query_as(
            "SELECT document_type, document_number FROM documents WHERE id = $1 FOR UPDATE",
        )
        .bind(&record.id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(number) = &record.document_number {
            let retired_elsewhere: Option<String> = sqlx::query_scalar(
                "SELECT document_id FROM retired_numbers WHERE document_number = $1 AND document_id <> $2",
            )
            .bind(number)
            .bind(&record.id)
            .fetch_optional(&mut *tx)
            .await?;
            if retired_elsewhere.is_some() {
                return Err(DbError::duplicate(NUMBER_FIELD, number.clone()));
            }
        }

        let row = sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(&record.id)
            .bind(&record.record_type)
            .bind(document_type_key(record.document_type))
            .bind(&record.document_number)
            .bind(&record.client_name)
            .bind(Json(&record.content))
            .bind(&record.created_by)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| Self::map_write_error(e, record))?;

        if let Some((old_type, Some(old_number))) = previous {
            if record.document_number.as_ref() != Some(&old_number) {
                debug!(id = %record.id, number = %old_number, "Retiring document number");
                sqlx::query(
                    r#"
                    INSERT INTO retired_numbers (document_number, document_type, document_id)
                    VALUES ($1, $2, $3)
                    ON CONFLICT (document_number) DO NOTHING
                    "#,
                )
                .bind(&old_number)
                .bind(&old_type)
                .bind(&record.id)
                .execute(&mut *tx)
                .await?;
            }
        }

        if let Some(number) = &record.document_number {
            sqlx::query("DELETE FROM retired_numbers WHERE document_number = $1 AND document_id = $2")
                .bind(number)
                .bind(&record.id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        row.into_record()
    }

    async fn get_by_id(&self, id: &str) -> DbResult<Option<DocumentRecord>> {
        let sql = format!("SELECT {} FROM documents WHERE id = $1", SELECT_COLUMNS);

        let row = sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(DocumentRow::into_record).transpose()
    }

    async fn list_by_type(&self, record_type: &str) -> DbResult<Vec<DocumentRecord>> {
        let sql = format!(
            "SELECT {} FROM documents WHERE record_type = $1 ORDER BY created_at, id",
            SELECT_COLUMNS
        );

        let rows = sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(record_type)
            .fetch_all(&self.pool)
            .await?;

        debug!(record_type = %record_type, count = rows.len(), "Listed documents");

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.id.clone();
            match row.into_record() {
                Ok(record) => records.push(record),
                Err(e) => warn!(id = %id, error = %e, "Skipping unreadable document row"),
            }
        }
        Ok(records)
    }

    async fn retired_numbers(&self) -> DbResult<Vec<IssuedNumber>> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT document_number, document_type FROM retired_numbers ORDER BY document_number",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(number, key)| match DocumentType::from_str(&key) {
                Ok(document_type) => Some(IssuedNumber {
                    document_type,
                    number,
                }),
                Err(e) => {
                    warn!(number = %number, error = %e, "Skipping retired number with unknown type");
                    None
                }
            })
            .collect())
    }

    async fn health_check(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

// =============================================================================
// Integration Tests (need a live database)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use docket_core::{DocumentContent, DocumentType, ACCOUNT_RECORD_TYPE};

    /// Set `DOCKET_TEST_DATABASE_URL` to run these against a scratch database.
    async fn test_db() -> Option<Database> {
        let url = std::env::var("DOCKET_TEST_DATABASE_URL").ok()?;
        Some(Database::new(DbConfig::new(url)).await.unwrap())
    }

    fn record(number: Option<&str>) -> DocumentRecord {
        DocumentRecord {
            id: uuid_like(),
            record_type: ACCOUNT_RECORD_TYPE.to_string(),
            document_type: DocumentType::Quotation,
            document_number: number.map(str::to_string),
            client_name: "Acme".to_string(),
            content: DocumentContent::default(),
            created_by: "ops@example.com".to_string(),
            created_at: None,
            updated_at: None,
        }
    }

    fn uuid_like() -> String {
        format!("test-{}", chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default())
    }

    #[tokio::test]
    async fn test_upsert_keeps_created_at() {
        let Some(db) = test_db().await else { return };
        let store = db.documents();

        let first = store.save(&record(None)).await.unwrap();
        let mut changed = first.clone();
        changed.client_name = "Acme Infra".to_string();
        let second = store.save(&changed).await.unwrap();

        assert_eq!(first.created_at, second.created_at);
        assert_eq!(second.client_name, "Acme Infra");
        assert!(store.get_by_id(&first.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_type_change_retires_number() {
        let Some(db) = test_db().await else { return };
        let store = db.documents();
        let suffix = uuid_like();
        let quote_number = format!("TEST/2026/10/QN/{}", suffix);

        let quote = store.save(&record(Some(&quote_number))).await.unwrap();
        let mut invoice = quote.clone();
        invoice.document_type = DocumentType::TaxInvoice;
        invoice.document_number = Some(format!("TEST/2026/10/TI/{}", suffix));
        store.save(&invoice).await.unwrap();

        let retired = store.retired_numbers().await.unwrap();
        let entry = retired.iter().find(|r| r.number == quote_number).unwrap();
        assert_eq!(entry.document_type, DocumentType::Quotation);

        let err = store.save(&record(Some(&quote_number))).await.unwrap_err();
        assert!(err.is_duplicate_number());
    }

    #[tokio::test]
    async fn test_duplicate_number_rejected() {
        let Some(db) = test_db().await else { return };
        let store = db.documents();
        let number = format!("TEST/2026/10/QN/{}", uuid_like());

        store.save(&record(Some(&number))).await.unwrap();
        let err = store.save(&record(Some(&number))).await.unwrap_err();
        assert!(err.is_duplicate_number());
    }
}
