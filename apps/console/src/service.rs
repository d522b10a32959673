//! # Document Service
//!
//! Save orchestration: validation, number allocation, persistence with
//! duplicate-number retry, editor bookkeeping and the chat notification.
//!
//! ## Save Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate_for_save ─► editor.begin_save                                 │
//! │                            │                                            │
//! │               needs number?├── no ──► gateway.save ───────────┐        │
//! │                            │ yes                               │        │
//! │                            ▼                                   │        │
//! │      list records + retired numbers ──fail──► first_in_scope   │        │
//! │                            │                   + warning       │        │
//! │                            ▼                                   │        │
//! │   ┌──────► allocator.next_number                               │        │
//! │   │                        │                                   │        │
//! │   │                        ▼                                   │        │
//! │   │                  gateway.save ──ok────────────────────────►┤        │
//! │   │                        │                                   │        │
//! │   └─ retry ◄── UniqueViolation (≤ max_number_retries)          │        │
//! │                            │                                   ▼        │
//! │                 SaveError::DuplicateNumber        editor.complete_save  │
//! │                                                   notifier.notify       │
//! │   any error ─► editor.abort_save                  (failure = warning)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::{debug, info, warn};

use docket_core::validation::validate_for_save;
use docket_core::{
    DocumentEditor, DocumentNumber, DocumentRecord, DocumentType, IssuedNumber, NumberAllocator,
    SavePlan, ACCOUNT_RECORD_TYPE,
};
use docket_db::{DbError, DbResult, DocumentGateway};

use crate::error::{ApiError, SaveError};
use crate::notify::{document_message, DocumentEvent, Notifier};
use crate::session::SessionContext;

// =============================================================================
// Save Report
// =============================================================================

/// Non-fatal problems that the operator should still see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SaveWarning {
    /// Issued numbers could not be listed; the number was allocated as the
    /// first of its month and may duplicate one issued earlier.
    NumberingDegraded { reason: String },
    /// The document was saved but the chat message was not delivered.
    NotificationFailed { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveReport {
    pub record: DocumentRecord,
    #[serde(skip)]
    pub event: DocumentEvent,
    /// Number minted by this save, if any.
    pub assigned_number: Option<String>,
    /// Storage writes attempted (1 unless a number collided).
    pub attempts: u32,
    pub warnings: Vec<SaveWarning>,
}

impl SaveReport {
    pub fn numbering_degraded(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, SaveWarning::NumberingDegraded { .. }))
    }
}

struct Persisted {
    record: DocumentRecord,
    assigned_number: Option<String>,
    attempts: u32,
}

// =============================================================================
// Service
// =============================================================================

pub struct DocumentService {
    documents: Arc<dyn DocumentGateway>,
    notifier: Arc<dyn Notifier>,
    allocator: NumberAllocator,
    max_number_retries: u32,
}

impl DocumentService {
    pub fn new(
        documents: Arc<dyn DocumentGateway>,
        notifier: Arc<dyn Notifier>,
        allocator: NumberAllocator,
        max_number_retries: u32,
    ) -> Self {
        DocumentService {
            documents,
            notifier,
            allocator,
            max_number_retries,
        }
    }

    pub fn documents(&self) -> &Arc<dyn DocumentGateway> {
        &self.documents
    }

    pub fn allocator(&self) -> &NumberAllocator {
        &self.allocator
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Every stored document, oldest first.
    pub async fn list(&self) -> DbResult<Vec<DocumentRecord>> {
        self.documents.list_by_type(ACCOUNT_RECORD_TYPE).await
    }

    /// Opens a stored document for editing.
    pub async fn open(&self, id: &str) -> Result<DocumentEditor, ApiError> {
        let record = self
            .documents
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Document", id))?;
        Ok(DocumentEditor::from_record(record)?)
    }

    /// The number the next save of `document_type` would mint today.
    pub async fn preview_number(
        &self,
        document_type: DocumentType,
        today: NaiveDate,
    ) -> (DocumentNumber, Option<SaveWarning>) {
        let (issued, warning) = self.issued_numbers(None).await;
        (self.allocate(document_type, issued.as_deref(), today), warning)
    }

    /// Next number over `issued`, or the first of the month when the issued
    /// numbers are unknown.
    fn allocate(
        &self,
        document_type: DocumentType,
        issued: Option<&[IssuedNumber]>,
        today: NaiveDate,
    ) -> DocumentNumber {
        match issued {
            Some(issued) => self.allocator.next_number(document_type, issued, today),
            None => self.allocator.first_in_scope(document_type, today),
        }
    }

    // -------------------------------------------------------------------------
    // Save
    // -------------------------------------------------------------------------

    /// Saves with today's local date as the numbering month.
    pub async fn save(
        &self,
        editor: &mut DocumentEditor,
        session: &SessionContext,
    ) -> Result<SaveReport, SaveError> {
        self.save_on(editor, session, Local::now().date_naive()).await
    }

    /// Saves the editor's document, numbering it in the month of `today`.
    ///
    /// On error the editor is left dirty and not saving; the error message
    /// is meant for the operator.
    pub async fn save_on(
        &self,
        editor: &mut DocumentEditor,
        session: &SessionContext,
        today: NaiveDate,
    ) -> Result<SaveReport, SaveError> {
        let record = editor.to_record();
        validate_for_save(&record)?;

        let event = if record.created_at.is_none() {
            DocumentEvent::Created
        } else {
            DocumentEvent::Updated
        };
        let plan = editor.begin_save()?;
        let mut warnings = Vec::new();

        let persisted = match self.persist(record, plan, today, &mut warnings).await {
            Ok(persisted) => persisted,
            Err(e) => {
                if let Err(abort) = editor.abort_save() {
                    warn!(error = %abort, "Failed to reset save state");
                }
                warn!(id = %editor.id(), error = %e, "Save failed");
                return Err(e);
            }
        };

        editor.complete_save(persisted.record.clone())?;
        info!(
            id = %persisted.record.id,
            number = ?persisted.record.document_number,
            attempts = persisted.attempts,
            backend = self.documents.backend(),
            "Document saved"
        );

        let text = document_message(event, &persisted.record, session);
        if let Err(e) = self.notifier.notify(&text).await {
            warn!(error = %e, "Chat notification failed");
            warnings.push(SaveWarning::NotificationFailed {
                reason: e.to_string(),
            });
        }

        Ok(SaveReport {
            record: persisted.record,
            event,
            assigned_number: persisted.assigned_number,
            attempts: persisted.attempts,
            warnings,
        })
    }

    async fn persist(
        &self,
        mut record: DocumentRecord,
        plan: SavePlan,
        today: NaiveDate,
        warnings: &mut Vec<SaveWarning>,
    ) -> Result<Persisted, SaveError> {
        if !plan.needs_number {
            let stored = self.documents.save(&record).await.map_err(|e| {
                duplicate_or_storage(e, record.document_number.clone().unwrap_or_default(), 1)
            })?;
            return Ok(Persisted {
                record: stored,
                assigned_number: None,
                attempts: 1,
            });
        }

        let (mut issued, warning) = self.issued_numbers(Some(&record.id)).await;
        warnings.extend(warning);

        let mut attempted: Vec<IssuedNumber> = Vec::new();
        let mut attempts = 0;
        loop {
            attempts += 1;
            let number = self
                .allocate(plan.document_type, issued.as_deref(), today)
                .to_string();
            record.document_type = plan.document_type;
            record.document_number = Some(number.clone());
            debug!(id = %record.id, number = %number, attempt = attempts, "Allocated document number");

            match self.documents.save(&record).await {
                Ok(stored) => {
                    return Ok(Persisted {
                        record: stored,
                        assigned_number: Some(number),
                        attempts,
                    });
                }
                Err(e) if e.is_duplicate_number() && attempts <= self.max_number_retries => {
                    warn!(number = %number, attempt = attempts, "Document number taken, re-allocating");
                    attempted.push(IssuedNumber {
                        document_type: plan.document_type,
                        number,
                    });
                    // A failed refresh keeps the previous snapshot; the
                    // attempted numbers still move the sequence forward.
                    let mut known = match self.list_issued(Some(&record.id)).await {
                        Ok(fresh) => fresh,
                        Err(_) => issued.take().unwrap_or_default(),
                    };
                    known.extend(attempted.iter().cloned());
                    issued = Some(known);
                }
                Err(e) => return Err(duplicate_or_storage(e, number, attempts)),
            }
        }
    }

    /// Issued numbers of every other document. A listing failure yields
    /// `None` (first number of the month) plus a warning.
    async fn issued_numbers(
        &self,
        exclude_id: Option<&str>,
    ) -> (Option<Vec<IssuedNumber>>, Option<SaveWarning>) {
        match self.list_issued(exclude_id).await {
            Ok(issued) => (Some(issued), None),
            Err(e) => {
                warn!(error = %e, "Could not list issued numbers, falling back to the first number of the month");
                (
                    None,
                    Some(SaveWarning::NumberingDegraded {
                        reason: e.to_string(),
                    }),
                )
            }
        }
    }

    /// Numbers held by other records plus every retired number. Retired
    /// numbers are never handed out again.
    async fn list_issued(&self, exclude_id: Option<&str>) -> DbResult<Vec<IssuedNumber>> {
        let records = self.documents.list_by_type(ACCOUNT_RECORD_TYPE).await?;
        let mut issued: Vec<IssuedNumber> = records
            .iter()
            .filter(|r| Some(r.id.as_str()) != exclude_id)
            .filter_map(IssuedNumber::from_record)
            .collect();
        issued.extend(self.documents.retired_numbers().await?);
        Ok(issued)
    }
}

fn duplicate_or_storage(err: DbError, number: String, attempts: u32) -> SaveError {
    if err.is_duplicate_number() {
        SaveError::DuplicateNumber { number, attempts }
    } else {
        SaveError::Storage(err)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingNotifier;
    use docket_core::{CatalogItem, ItemKind, Money, QuoteDetails};
    use docket_db::MemoryStore;
    use rust_decimal::Decimal;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    fn session() -> SessionContext {
        SessionContext::new("ops@example.com", None)
    }

    fn service(store: Arc<MemoryStore>, notifier: Arc<RecordingNotifier>) -> DocumentService {
        DocumentService::new(store, notifier, NumberAllocator::default(), 3)
    }

    fn editor(document_type: DocumentType) -> DocumentEditor {
        let mut editor = DocumentEditor::new(document_type, "ops@example.com").unwrap();
        editor.set_quote_details(QuoteDetails {
            client_name: "Acme".to_string(),
            ..QuoteDetails::default()
        });
        let item = CatalogItem {
            id: "svc-1".to_string(),
            kind: ItemKind::Service,
            description: "Borehole drilling".to_string(),
            unit: "m".to_string(),
            price: Money::from_rupees(1000),
            hsn_code: "998341".to_string(),
            term_groups: vec![],
            technical_groups: vec![],
            service_attributes: None,
        };
        editor.add_from_catalog(&item, Decimal::from(2)).unwrap();
        editor
    }

    #[tokio::test]
    async fn test_first_save_mints_number_and_notifies() {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let service = service(store.clone(), notifier.clone());

        let mut doc = editor(DocumentType::Quotation);
        assert!(doc.is_dirty());

        let report = service.save_on(&mut doc, &session(), today()).await.unwrap();
        assert_eq!(report.assigned_number.as_deref(), Some("ORG/2026/10/QN/001"));
        assert_eq!(report.event, DocumentEvent::Created);
        assert!(report.warnings.is_empty());
        assert!(!doc.is_dirty());
        assert!(!doc.is_saving());
        assert_eq!(doc.document_number(), Some("ORG/2026/10/QN/001"));
        assert_eq!(notifier.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_resave_keeps_number() {
        let store = Arc::new(MemoryStore::new());
        let service = service(store.clone(), Arc::new(RecordingNotifier::new()));

        let mut doc = editor(DocumentType::Quotation);
        service.save_on(&mut doc, &session(), today()).await.unwrap();

        doc.set_discount(docket_core::Rate::from_bps(500)).unwrap();
        let report = service.save_on(&mut doc, &session(), today()).await.unwrap();
        assert_eq!(report.assigned_number, None);
        assert_eq!(report.event, DocumentEvent::Updated);
        assert_eq!(doc.document_number(), Some("ORG/2026/10/QN/001"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_type_change_mints_new_number() {
        let store = Arc::new(MemoryStore::new());
        let service = service(store.clone(), Arc::new(RecordingNotifier::new()));

        let mut doc = editor(DocumentType::Quotation);
        service.save_on(&mut doc, &session(), today()).await.unwrap();

        doc.set_document_type(DocumentType::TaxInvoice);
        let report = service.save_on(&mut doc, &session(), today()).await.unwrap();
        assert_eq!(report.assigned_number.as_deref(), Some("ORG/2026/10/TI/001"));
    }

    #[tokio::test]
    async fn test_number_given_up_on_type_change_is_not_reissued() {
        let store = Arc::new(MemoryStore::new());
        let service = service(store.clone(), Arc::new(RecordingNotifier::new()));

        let mut first = editor(DocumentType::Quotation);
        service.save_on(&mut first, &session(), today()).await.unwrap();
        first.set_document_type(DocumentType::TaxInvoice);
        service.save_on(&mut first, &session(), today()).await.unwrap();

        let (next, _) = service.preview_number(DocumentType::Quotation, today()).await;
        assert_eq!(next.to_string(), "ORG/2026/10/QN/002");

        let mut second = editor(DocumentType::Quotation);
        let report = service.save_on(&mut second, &session(), today()).await.unwrap();
        assert_eq!(report.assigned_number.as_deref(), Some("ORG/2026/10/QN/002"));
        assert_eq!(report.attempts, 1);
    }

    #[tokio::test]
    async fn test_invalid_document_leaves_editor_untouched() {
        let store = Arc::new(MemoryStore::new());
        let service = service(store.clone(), Arc::new(RecordingNotifier::new()));

        let mut doc = DocumentEditor::new(DocumentType::Quotation, "ops@example.com").unwrap();
        let err = service.save_on(&mut doc, &session(), today()).await.unwrap_err();
        assert!(matches!(err, SaveError::Validation(_)));
        assert!(!doc.is_saving());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_preview_number() {
        let store = Arc::new(MemoryStore::new());
        let service = service(store.clone(), Arc::new(RecordingNotifier::new()));

        let mut doc = editor(DocumentType::DeliveryChallan);
        service.save_on(&mut doc, &session(), today()).await.unwrap();

        let (next, warning) = service.preview_number(DocumentType::DeliveryChallan, today()).await;
        assert_eq!(next.to_string(), "ORG/2026/10/DC/002");
        assert!(warning.is_none());
    }
}
