//! # Console Commands
//!
//! One function per CLI subcommand. Each takes the shared [`AppState`] and
//! returns a serializable result or an [`ApiError`]; printing is left to
//! `main`.

use chrono::{DateTime, Local, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

use docket_core::totals::compute_with_config;
use docket_core::{
    CatalogItem, ClauseKind, DocumentEditor, DocumentLayout, DocumentRecord, DocumentType,
    ItemKind, Money, QuoteDetails, Rate,
};

use crate::error::ApiError;
use crate::print::render_text;
use crate::service::{SaveReport, SaveWarning};
use crate::session::SessionContext;
use crate::AppState;

// =============================================================================
// list
// =============================================================================

/// One row of `docket list`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: String,
    pub document_type: DocumentType,
    pub document_number: Option<String>,
    pub client_name: String,
    pub item_count: usize,
    pub grand_total: Money,
    pub created_at: Option<DateTime<Utc>>,
}

pub async fn list_documents(state: &AppState) -> Result<Vec<DocumentSummary>, ApiError> {
    let records = state.service.list().await?;
    debug!(count = records.len(), "Listing documents");

    Ok(records
        .into_iter()
        .map(|record| {
            let totals = compute_with_config(&record.content.items, record.content.discount, state.tax);
            DocumentSummary {
                item_count: record.content.items.len(),
                grand_total: totals.grand_total,
                id: record.id,
                document_type: record.document_type,
                document_number: record.document_number,
                client_name: record.client_name,
                created_at: record.created_at,
            }
        })
        .collect())
}

// =============================================================================
// show
// =============================================================================

/// Lays a stored document out against the clause catalogs.
pub async fn layout_document(state: &AppState, id: &str) -> Result<(DocumentLayout, DocumentRecord), ApiError> {
    let record = state
        .service
        .documents()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Document", id))?;

    let terms = state.catalog.clauses(ClauseKind::Term).await?;
    let technicals = state.catalog.clauses(ClauseKind::Technical).await?;

    let layout = DocumentLayout::assemble(&record, &terms, &technicals, &state.pagination, state.tax);
    debug!(id = %id, pages = layout.total_pages(), "Document laid out");
    Ok((layout, record))
}

/// Plain-text preview of every printed page.
pub async fn show_document(state: &AppState, id: &str) -> Result<String, ApiError> {
    let (layout, record) = layout_document(state, id).await?;
    Ok(render_text(&layout, &record, &state.config.organization))
}

// =============================================================================
// next-number
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct NumberPreview {
    pub number: String,
    pub warning: Option<SaveWarning>,
}

pub async fn next_number(
    state: &AppState,
    document_type: DocumentType,
    today: Option<NaiveDate>,
) -> Result<NumberPreview, ApiError> {
    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let (number, warning) = state.service.preview_number(document_type, today).await;
    Ok(NumberPreview {
        number: number.to_string(),
        warning,
    })
}

// =============================================================================
// new
// =============================================================================

/// Input of `docket new`.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub document_type: DocumentType,
    pub client_name: String,
    pub client_address: Vec<String>,
    pub subject: Option<String>,
    /// `(catalog id, quantity)` in print order.
    pub items: Vec<(String, Decimal)>,
    pub discount_percent: Option<f64>,
    pub payment: Option<Money>,
}

/// Builds a document from catalog entries and saves it.
pub async fn new_document(
    state: &AppState,
    session: &SessionContext,
    input: NewDocument,
) -> Result<SaveReport, ApiError> {
    session.validate()?;

    let mut catalog: Vec<CatalogItem> = state.catalog.catalog_items(ItemKind::Service).await?;
    catalog.extend(state.catalog.catalog_items(ItemKind::Test).await?);

    let mut editor = DocumentEditor::new(input.document_type, session.user_email.clone())?;
    editor.set_quote_details(QuoteDetails {
        client_name: input.client_name,
        client_address: input.client_address,
        subject: input.subject,
        document_date: Some(Local::now().date_naive()),
        payment_amount: input.payment,
        ..QuoteDetails::default()
    });
    if let Some(pct) = input.discount_percent {
        editor.set_discount(Rate::from_percentage("discount", pct)?)?;
    }

    for (id, quantity) in &input.items {
        let entry = catalog
            .iter()
            .find(|entry| &entry.id == id)
            .ok_or_else(|| ApiError::not_found("Catalog item", id))?;
        editor.add_from_catalog(entry, *quantity)?;
    }

    let report = state.service.save(&mut editor, session).await?;
    for warning in &report.warnings {
        warn!(?warning, "Saved with warning");
    }
    Ok(report)
}

// =============================================================================
// check
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub documents_backend: &'static str,
    pub documents_ok: bool,
    pub catalog_ok: bool,
    pub errors: Vec<String>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.documents_ok && self.catalog_ok
    }
}

pub async fn check(state: &AppState) -> HealthReport {
    let documents = state.service.documents();
    let mut errors = Vec::new();

    let documents_ok = match documents.health_check().await {
        Ok(()) => true,
        Err(e) => {
            errors.push(format!("documents ({}): {}", documents.backend(), e));
            false
        }
    };
    let catalog_ok = match state.catalog.clauses(ClauseKind::Term).await {
        Ok(_) => true,
        Err(e) => {
            errors.push(format!("catalog: {}", e));
            false
        }
    };

    HealthReport {
        documents_backend: documents.backend(),
        documents_ok,
        catalog_ok,
        errors,
    }
}
