//! # In-Memory Store
//!
//! Both gateways over process memory. Used when no backend URL is
//! configured (offline previews) and by the save-flow tests.
//!
//! Applies the same rules as the persistent stores: `created_at` fixed on
//! first insert, `updated_at` refreshed on every save, one record per
//! document number, and numbers given up on a type change stay retired.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use docket_core::{
    CatalogItem, ClauseEntry, ClauseKind, DocumentRecord, DocumentType, IssuedNumber, ItemKind,
};

use crate::error::{DbError, DbResult, NUMBER_FIELD};
use crate::gateway::{CatalogGateway, DocumentGateway};

#[derive(Debug, Default)]
struct DocumentState {
    records: HashMap<String, DocumentRecord>,
    /// Retired number → (record that held it, type it was minted for).
    retired: HashMap<String, (String, DocumentType)>,
}

impl DocumentState {
    fn number_taken(&self, number: &str, id: &str) -> bool {
        let held = self
            .records
            .values()
            .any(|r| r.id != id && r.document_number.as_deref() == Some(number));
        let retired = self
            .retired
            .get(number)
            .is_some_and(|(holder, _)| holder != id);
        held || retired
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<DocumentState>,
    catalog: Vec<CatalogItem>,
    terms: Vec<ClauseEntry>,
    technicals: Vec<ClauseEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(mut self, items: Vec<CatalogItem>) -> Self {
        self.catalog = items;
        self
    }

    pub fn with_clauses(mut self, kind: ClauseKind, mut clauses: Vec<ClauseEntry>) -> Self {
        clauses.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.id.cmp(&b.id)));
        match kind {
            ClauseKind::Term => self.terms = clauses,
            ClauseKind::Technical => self.technicals = clauses,
        }
        self
    }

    /// Preloads records as-is, keeping their timestamps.
    pub fn with_records(self, records: impl IntoIterator<Item = DocumentRecord>) -> Self {
        let state = DocumentState {
            records: records.into_iter().map(|r| (r.id.clone(), r)).collect(),
            retired: HashMap::new(),
        };
        MemoryStore {
            documents: RwLock::new(state),
            ..self
        }
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.records.is_empty()
    }
}

#[async_trait]
impl DocumentGateway for MemoryStore {
    async fn save(&self, record: &DocumentRecord) -> DbResult<DocumentRecord> {
        let mut state = self.documents.write().await;

        if let Some(number) = &record.document_number {
            if state.number_taken(number, &record.id) {
                return Err(DbError::duplicate(NUMBER_FIELD, number.clone()));
            }
        }

        let now = Utc::now();
        let mut stored = record.clone();
        stored.updated_at = Some(now);
        match state.records.get(&record.id).cloned() {
            Some(previous) => {
                stored.created_at = previous.created_at.or(Some(now));
                stored.created_by = previous.created_by;
                if let Some(old) = previous.document_number {
                    if stored.document_number.as_ref() != Some(&old) {
                        debug!(id = %stored.id, number = %old, "Retiring document number");
                        state.retired.insert(old, (stored.id.clone(), previous.document_type));
                    }
                }
            }
            None => stored.created_at = Some(now),
        }
        // Taking back a number this record retired earlier makes it live again.
        if let Some(number) = &stored.document_number {
            state.retired.remove(number);
        }

        state.records.insert(stored.id.clone(), stored.clone());
        debug!(id = %stored.id, number = ?stored.document_number, "Stored document in memory");
        Ok(stored)
    }

    async fn get_by_id(&self, id: &str) -> DbResult<Option<DocumentRecord>> {
        Ok(self.documents.read().await.records.get(id).cloned())
    }

    async fn list_by_type(&self, record_type: &str) -> DbResult<Vec<DocumentRecord>> {
        let mut list: Vec<DocumentRecord> = self
            .documents
            .read()
            .await
            .records
            .values()
            .filter(|r| r.record_type == record_type)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(list)
    }

    async fn retired_numbers(&self) -> DbResult<Vec<IssuedNumber>> {
        let mut retired: Vec<IssuedNumber> = self
            .documents
            .read()
            .await
            .retired
            .iter()
            .map(|(number, (_, document_type))| IssuedNumber {
                document_type: *document_type,
                number: number.clone(),
            })
            .collect();
        retired.sort_by(|a, b| a.number.cmp(&b.number));
        Ok(retired)
    }

    async fn health_check(&self) -> DbResult<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[async_trait]
impl CatalogGateway for MemoryStore {
    async fn catalog_items(&self, kind: ItemKind) -> DbResult<Vec<CatalogItem>> {
        Ok(self.catalog.iter().filter(|i| i.kind == kind).cloned().collect())
    }

    async fn clauses(&self, kind: ClauseKind) -> DbResult<Vec<ClauseEntry>> {
        Ok(match kind {
            ClauseKind::Term => self.terms.clone(),
            ClauseKind::Technical => self.technicals.clone(),
        })
    }
}
