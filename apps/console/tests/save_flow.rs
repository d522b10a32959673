//! End-to-end save flow against in-memory gateways.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;

use docket_console::commands::{self, NewDocument};
use docket_console::config::ConsoleConfig;
use docket_console::error::{ApiError, ErrorCode, SaveError};
use docket_console::notify::{DocumentEvent, Notifier, NotifyError, RecordingNotifier};
use docket_console::service::{DocumentService, SaveWarning};
use docket_console::{AppState, SessionContext};
use docket_core::{
    CatalogItem, ClauseEntry, ClauseKind, DocumentContent, DocumentEditor, DocumentRecord,
    DocumentType, IssuedNumber, ItemKind, Money, NavigationGuard, NumberAllocator, QuoteDetails,
    Rate, ACCOUNT_RECORD_TYPE,
};
use docket_db::adapter::record_from_json;
use docket_db::{DbError, DbResult, DocumentGateway, MemoryStore};

// =============================================================================
// Fixtures
// =============================================================================

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
}

fn session() -> SessionContext {
    SessionContext::new("ops@example.com", Some("Ops".to_string()))
}

fn catalog_item(id: &str, kind: ItemKind, rupees: i64, terms: &[&str], technicals: &[&str]) -> CatalogItem {
    CatalogItem {
        id: id.to_string(),
        kind,
        description: format!("Entry {}", id),
        unit: "nos".to_string(),
        price: Money::from_rupees(rupees),
        hsn_code: "998341".to_string(),
        term_groups: terms.iter().map(|s| s.to_string()).collect(),
        technical_groups: technicals.iter().map(|s| s.to_string()).collect(),
        service_attributes: None,
    }
}

fn clause(id: &str, group: &str, order: i32) -> ClauseEntry {
    ClauseEntry {
        id: id.to_string(),
        group_type: group.to_string(),
        text: format!("Clause {}", id),
        sort_order: order,
    }
}

fn draft(document_type: DocumentType) -> DocumentEditor {
    let mut editor = DocumentEditor::new(document_type, "ops@example.com").unwrap();
    editor.set_quote_details(QuoteDetails {
        client_name: "Acme Infra".to_string(),
        ..QuoteDetails::default()
    });
    editor
        .add_from_catalog(&catalog_item("svc-1", ItemKind::Service, 10_000, &[], &[]), Decimal::ONE)
        .unwrap();
    editor
}

/// A record already holding `number`, as if saved by another operator.
fn issued(id: &str, number: &str) -> DocumentRecord {
    DocumentRecord {
        id: id.to_string(),
        record_type: ACCOUNT_RECORD_TYPE.to_string(),
        document_type: DocumentType::Quotation,
        document_number: Some(number.to_string()),
        client_name: "Other".to_string(),
        content: DocumentContent::default(),
        created_by: "someone@example.com".to_string(),
        created_at: None,
        updated_at: None,
    }
}

/// Delegates to a memory store but can fail or hide listings.
struct FlakyListing {
    inner: MemoryStore,
    fail_listing: bool,
    list_calls: AtomicUsize,
}

impl FlakyListing {
    /// Listing errors out.
    fn failing(inner: MemoryStore) -> Self {
        FlakyListing {
            inner,
            fail_listing: true,
            list_calls: AtomicUsize::new(0),
        }
    }

    /// Listing succeeds but sees nothing, like a snapshot taken just before
    /// other operators saved.
    fn stale(inner: MemoryStore) -> Self {
        FlakyListing {
            inner,
            fail_listing: false,
            list_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl DocumentGateway for FlakyListing {
    async fn save(&self, record: &DocumentRecord) -> DbResult<DocumentRecord> {
        self.inner.save(record).await
    }

    async fn get_by_id(&self, id: &str) -> DbResult<Option<DocumentRecord>> {
        self.inner.get_by_id(id).await
    }

    async fn list_by_type(&self, _record_type: &str) -> DbResult<Vec<DocumentRecord>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing {
            Err(DbError::ConnectionFailed("connection refused".to_string()))
        } else {
            Ok(Vec::new())
        }
    }

    async fn retired_numbers(&self) -> DbResult<Vec<IssuedNumber>> {
        if self.fail_listing {
            Err(DbError::ConnectionFailed("connection refused".to_string()))
        } else {
            Ok(Vec::new())
        }
    }

    async fn health_check(&self) -> DbResult<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "flaky"
    }
}

struct BrokenNotifier;

#[async_trait]
impl Notifier for BrokenNotifier {
    async fn notify(&self, _text: &str) -> Result<(), NotifyError> {
        Err(NotifyError::Rejected(500))
    }
}

fn service_over(documents: Arc<dyn DocumentGateway>, retries: u32) -> DocumentService {
    DocumentService::new(documents, Arc::new(RecordingNotifier::new()), NumberAllocator::default(), retries)
}

// =============================================================================
// Numbering
// =============================================================================

#[tokio::test]
async fn sequential_saves_number_per_type_and_month() {
    let store = Arc::new(MemoryStore::new());
    let service = service_over(store.clone(), 3);

    let mut numbers = Vec::new();
    for document_type in [
        DocumentType::Quotation,
        DocumentType::Quotation,
        DocumentType::TaxInvoice,
        DocumentType::Quotation,
    ] {
        let mut doc = draft(document_type);
        let report = service.save_on(&mut doc, &session(), today()).await.unwrap();
        numbers.push(report.assigned_number.unwrap());
    }

    assert_eq!(
        numbers,
        vec![
            "ORG/2026/10/QN/001",
            "ORG/2026/10/QN/002",
            "ORG/2026/10/TI/001",
            "ORG/2026/10/QN/003",
        ]
    );

    // A new month starts again at 001.
    let mut doc = draft(DocumentType::Quotation);
    let november = NaiveDate::from_ymd_opt(2026, 11, 2).unwrap();
    let report = service.save_on(&mut doc, &session(), november).await.unwrap();
    assert_eq!(report.assigned_number.as_deref(), Some("ORG/2026/11/QN/001"));
}

#[tokio::test]
async fn listing_failure_degrades_to_first_number_with_warning() {
    let store = Arc::new(FlakyListing::failing(MemoryStore::new()));
    let service = service_over(store.clone(), 3);

    let mut doc = draft(DocumentType::Quotation);
    let report = service.save_on(&mut doc, &session(), today()).await.unwrap();

    assert_eq!(report.assigned_number.as_deref(), Some("ORG/2026/10/QN/001"));
    assert!(report.numbering_degraded());
    assert!(matches!(
        report.warnings.as_slice(),
        [SaveWarning::NumberingDegraded { .. }]
    ));
}

#[tokio::test]
async fn degraded_collision_moves_past_taken_numbers() {
    let inner = MemoryStore::new().with_records(vec![
        issued("a", "ORG/2026/10/QN/001"),
        issued("b", "ORG/2026/10/QN/002"),
    ]);
    let store = Arc::new(FlakyListing::failing(inner));
    let service = service_over(store.clone(), 3);

    let mut doc = draft(DocumentType::Quotation);
    let report = service.save_on(&mut doc, &session(), today()).await.unwrap();

    assert_eq!(report.assigned_number.as_deref(), Some("ORG/2026/10/QN/003"));
    assert_eq!(report.attempts, 3);
    assert!(report.numbering_degraded());
}

#[tokio::test]
async fn duplicate_number_is_retried_against_stale_snapshot() {
    let inner = MemoryStore::new().with_records(vec![
        issued("a", "ORG/2026/10/QN/001"),
        issued("b", "ORG/2026/10/QN/002"),
        issued("c", "ORG/2026/10/QN/003"),
    ]);
    let store = Arc::new(FlakyListing::stale(inner));
    let service = service_over(store.clone(), 3);

    let mut doc = draft(DocumentType::Quotation);
    let report = service.save_on(&mut doc, &session(), today()).await.unwrap();

    assert_eq!(report.assigned_number.as_deref(), Some("ORG/2026/10/QN/004"));
    assert_eq!(report.attempts, 4);
    // Stale but successful listings are not a degradation.
    assert!(report.warnings.is_empty());
    assert!(store.list_calls.load(Ordering::SeqCst) >= 2);
}

#[tokio::test]
async fn retries_exhausted_surface_duplicate_number() {
    let inner = MemoryStore::new().with_records(vec![
        issued("a", "ORG/2026/10/QN/001"),
        issued("b", "ORG/2026/10/QN/002"),
        issued("c", "ORG/2026/10/QN/003"),
    ]);
    let store = Arc::new(FlakyListing::stale(inner));
    let service = service_over(store.clone(), 2);

    let mut doc = draft(DocumentType::Quotation);
    let err = service.save_on(&mut doc, &session(), today()).await.unwrap_err();

    match &err {
        SaveError::DuplicateNumber { number, attempts } => {
            assert_eq!(number, "ORG/2026/10/QN/003");
            assert_eq!(*attempts, 3);
        }
        other => panic!("expected DuplicateNumber, got {other:?}"),
    }
    assert_eq!(ApiError::from(err).code, ErrorCode::DuplicateNumber);

    // The editor keeps its edits and can be saved again.
    assert!(!doc.is_saving());
    assert!(doc.is_dirty());
    assert_eq!(doc.document_number(), None);
    assert_eq!(doc.navigation_guard(), NavigationGuard::ConfirmUnsaved);
}

// =============================================================================
// Editor Bookkeeping
// =============================================================================

#[tokio::test]
async fn saved_document_round_trips_through_storage() {
    let store = Arc::new(MemoryStore::new());
    let service = service_over(store.clone(), 3);

    let mut doc = draft(DocumentType::TaxInvoice);
    let report = service.save_on(&mut doc, &session(), today()).await.unwrap();
    assert_eq!(doc.navigation_guard(), NavigationGuard::Allow);

    let reopened = service.open(&report.record.id).await.unwrap();
    assert_eq!(reopened.document_number(), doc.document_number());
    assert_eq!(reopened.items(), doc.items());
    assert!(!reopened.is_dirty());
    assert!(!reopened.needs_number());
}

#[tokio::test]
async fn dirty_state_follows_edits_and_saves() {
    let store = Arc::new(MemoryStore::new());
    let service = service_over(store.clone(), 3);

    let mut doc = DocumentEditor::new(DocumentType::Quotation, "ops@example.com").unwrap();
    assert!(!doc.is_dirty());

    doc.add_from_catalog(&catalog_item("svc-1", ItemKind::Service, 10_000, &[], &[]), Decimal::ONE)
        .unwrap();
    assert!(doc.is_dirty());

    doc.set_quote_details(QuoteDetails {
        client_name: "Acme Infra".to_string(),
        ..QuoteDetails::default()
    });
    service.save_on(&mut doc, &session(), today()).await.unwrap();
    assert!(!doc.is_dirty());

    doc.set_discount(Rate::from_bps(500)).unwrap();
    assert!(doc.is_dirty());
    assert_eq!(doc.navigation_guard(), NavigationGuard::ConfirmUnsaved);
}

#[tokio::test]
async fn legacy_record_with_plain_id_can_be_edited_and_saved() {
    let legacy = record_from_json(json!({
        "id": "legacy-1",
        "type": "account",
        "documentType": "Quotation",
        "documentNumber": "ORG/2025/04/QN/017",
        "clientName": "Old Client",
        "createdBy": "admin@example.com",
        "createdAt": 1_700_000_000_000_i64,
        "content": {
            "quoteDetails": { "clientName": "Old Client" },
            "items": [
                {"id": 1, "description": "Cube test", "unitPrice": 450.5, "quantity": 3}
            ],
            "discount": 12.5
        }
    }))
    .unwrap();
    let store = Arc::new(MemoryStore::new().with_records(vec![legacy]));
    let service = service_over(store.clone(), 3);

    let mut doc = service.open("legacy-1").await.unwrap();
    doc.set_discount(Rate::from_bps(500)).unwrap();
    let report = service.save_on(&mut doc, &session(), today()).await.unwrap();

    assert_eq!(report.event, DocumentEvent::Updated);
    assert_eq!(report.assigned_number, None);
    assert_eq!(report.record.id, "legacy-1");
    assert_eq!(report.record.document_number.as_deref(), Some("ORG/2025/04/QN/017"));
    assert!(!doc.is_dirty());
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn open_unknown_document_is_not_found() {
    let service = service_over(Arc::new(MemoryStore::new()), 3);
    let err = service.open("missing").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn notification_failure_is_only_a_warning() {
    let store = Arc::new(MemoryStore::new());
    let service = DocumentService::new(store.clone(), Arc::new(BrokenNotifier), NumberAllocator::default(), 3);

    let mut doc = draft(DocumentType::Quotation);
    let report = service.save_on(&mut doc, &session(), today()).await.unwrap();

    assert!(matches!(
        report.warnings.as_slice(),
        [SaveWarning::NotificationFailed { .. }]
    ));
    assert_eq!(store.len().await, 1);
    assert!(!doc.is_dirty());
}

// =============================================================================
// Commands
// =============================================================================

fn app_state(notifier: Arc<RecordingNotifier>) -> AppState {
    let store = Arc::new(
        MemoryStore::new()
            .with_catalog(vec![
                catalog_item("svc-bh", ItemKind::Service, 1_500, &["General", "Drilling"], &["Drilling"]),
                catalog_item("tst-gsa", ItemKind::Test, 750, &["Laboratory"], &[]),
            ])
            .with_clauses(
                ClauseKind::Term,
                vec![
                    clause("t1", "General", 1),
                    clause("t2", "Drilling", 2),
                    clause("t3", "Laboratory", 3),
                ],
            )
            .with_clauses(ClauseKind::Technical, vec![clause("x1", "Drilling", 1)]),
    );
    AppState::with_gateways(ConsoleConfig::default(), store.clone(), store, notifier).unwrap()
}

#[tokio::test]
async fn new_document_command_saves_and_previews() {
    let notifier = Arc::new(RecordingNotifier::new());
    let state = app_state(notifier.clone());

    let report = commands::new_document(
        &state,
        &session(),
        NewDocument {
            document_type: DocumentType::Quotation,
            client_name: "Acme Infra".to_string(),
            client_address: vec!["Plot 4, MIDC".to_string()],
            subject: Some("Soil investigation".to_string()),
            items: vec![
                ("svc-bh".to_string(), Decimal::new(125, 1)),
                ("tst-gsa".to_string(), Decimal::from(4)),
            ],
            discount_percent: Some(10.0),
            payment: None,
        },
    )
    .await
    .unwrap();

    let number = report.assigned_number.clone().unwrap();
    assert!(number.starts_with("ORG/") && number.ends_with("/QN/001"));
    assert_eq!(report.record.content.items.len(), 2);
    assert_eq!(notifier.messages().len(), 1);
    assert!(notifier.messages()[0].contains("created for Acme Infra by Ops (ops@example.com)"));

    let listed = commands::list_documents(&state).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].item_count, 2);

    let (layout, _) = commands::layout_document(&state, &report.record.id).await.unwrap();
    // 1 item page + bank page + 1 term page + 1 technical page
    assert_eq!(layout.total_pages(), 4);

    let preview = commands::show_document(&state, &report.record.id).await.unwrap();
    assert!(preview.contains("Clause t2"));
    assert!(preview.contains("Clause x1"));
    assert!(preview.contains(&format!("Quotation #{} | Page 4 of 4", number)));
}

#[tokio::test]
async fn new_document_with_unknown_catalog_entry_fails() {
    let state = app_state(Arc::new(RecordingNotifier::new()));

    let err = commands::new_document(
        &state,
        &session(),
        NewDocument {
            document_type: DocumentType::Quotation,
            client_name: "Acme".to_string(),
            client_address: vec![],
            subject: None,
            items: vec![("nope".to_string(), Decimal::ONE)],
            discount_percent: None,
            payment: None,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn next_number_and_check_commands() {
    let state = app_state(Arc::new(RecordingNotifier::new()));

    let preview = commands::next_number(&state, DocumentType::PurchaseOrder, Some(today()))
        .await
        .unwrap();
    assert_eq!(preview.number, "ORG/2026/10/PO/001");
    assert!(preview.warning.is_none());

    let health = commands::check(&state).await;
    assert!(health.is_healthy());
    assert_eq!(health.documents_backend, "memory");
}
