//! # Catalog Repository
//!
//! Read-only access to `catalog_items` and `clauses`.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use docket_core::{CatalogItem, ClauseEntry, ClauseKind, ItemKind};

use crate::adapter::{CatalogItemRow, ClauseRow};
use crate::error::DbResult;
use crate::gateway::CatalogGateway;

#[derive(Debug, Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        PgCatalog { pool }
    }

    /// Inserts or replaces a catalog item (used by the seed binary).
    pub async fn upsert_item(&self, item: &CatalogItem) -> DbResult<()> {
        let attributes = item.service_attributes.clone().unwrap_or_default();

        sqlx::query(
            r#"
            INSERT INTO catalog_items (
                id, kind, description, unit, price, hsn_code,
                term_groups, technical_groups,
                sampling_method, borehole_count, measure_unit
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) DO UPDATE SET
                kind = EXCLUDED.kind,
                description = EXCLUDED.description,
                unit = EXCLUDED.unit,
                price = EXCLUDED.price,
                hsn_code = EXCLUDED.hsn_code,
                term_groups = EXCLUDED.term_groups,
                technical_groups = EXCLUDED.technical_groups,
                sampling_method = EXCLUDED.sampling_method,
                borehole_count = EXCLUDED.borehole_count,
                measure_unit = EXCLUDED.measure_unit
            "#,
        )
        .bind(&item.id)
        .bind(item.kind.as_str())
        .bind(&item.description)
        .bind(&item.unit)
        .bind(item.price.amount())
        .bind(&item.hsn_code)
        .bind(&item.term_groups)
        .bind(&item.technical_groups)
        .bind(&attributes.sampling_method)
        .bind(attributes.borehole_count.and_then(|n| i32::try_from(n).ok()))
        .bind(&attributes.measure_unit)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts or replaces a clause (used by the seed binary).
    pub async fn upsert_clause(&self, kind: ClauseKind, clause: &ClauseEntry) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO clauses (id, kind, group_type, text, sort_order)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                kind = EXCLUDED.kind,
                group_type = EXCLUDED.group_type,
                text = EXCLUDED.text,
                sort_order = EXCLUDED.sort_order
            "#,
        )
        .bind(&clause.id)
        .bind(kind.as_str())
        .bind(&clause.group_type)
        .bind(&clause.text)
        .bind(clause.sort_order)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl CatalogGateway for PgCatalog {
    async fn catalog_items(&self, kind: ItemKind) -> DbResult<Vec<CatalogItem>> {
        let rows = sqlx::query_as::<_, CatalogItemRow>(
            r#"
            SELECT
                id, kind, description, unit, price, hsn_code,
                term_groups, technical_groups,
                sampling_method, borehole_count, measure_unit
            FROM catalog_items
            WHERE kind = $1 AND is_active
            ORDER BY description, id
            "#,
        )
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        debug!(kind = kind.as_str(), count = rows.len(), "Loaded catalog items");
        rows.into_iter().map(CatalogItemRow::into_item).collect()
    }

    async fn clauses(&self, kind: ClauseKind) -> DbResult<Vec<ClauseEntry>> {
        let rows = sqlx::query_as::<_, ClauseRow>(
            r#"
            SELECT id, group_type, text, sort_order
            FROM clauses
            WHERE kind = $1
            ORDER BY sort_order, id
            "#,
        )
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        debug!(kind = kind.as_str(), count = rows.len(), "Loaded clauses");
        Ok(rows.into_iter().map(ClauseEntry::from).collect())
    }
}
