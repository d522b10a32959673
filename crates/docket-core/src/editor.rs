//! # Document Editor
//!
//! In-memory state of the document being edited: ordered line items,
//! header details, discount, type and number, plus the two flags that gate
//! navigation (dirty, saving).
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   new / load ──► Clean ──edit──► Dirty                                  │
//! │                    ▲               │                                    │
//! │                    │          begin_save                                │
//! │                    │               ▼                                    │
//! │                    │            Saving ──abort_save──► Dirty            │
//! │                    │               │                                    │
//! │                    └─complete_save─┘  (re-snapshot, adopt number)       │
//! │                                                                         │
//! │   Dirty  ⇔  serialize({quote_details, items, document_type, discount}) │
//! │             ≠ snapshot taken at creation / load / last save             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Row Identity
//! Rows get a monotonic [`RowId`] from the editor. Ids are never reused, so
//! removing row 3 and adding a new row yields row `max + 1`, not 3.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::numbering::parse_number;
use crate::pagination::{technical_groups, term_groups};
use crate::types::{
    CatalogItem, DocumentContent, DocumentRecord, DocumentType, LineItem, QuoteDetails, Rate,
    RowId, ACCOUNT_RECORD_TYPE,
};
use crate::validation::{validate_quantity, validate_rate, validate_unit_price};

// =============================================================================
// Navigation Guard
// =============================================================================

/// What the UI must do when the operator tries to leave the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum NavigationGuard {
    /// Nothing to lose.
    Allow,
    /// Unsaved changes: ask before leaving.
    ConfirmUnsaved,
    /// A save is in flight: leaving would abandon the write.
    BlockWhileSaving,
}

/// Returned by [`DocumentEditor::begin_save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavePlan {
    /// A fresh number must be minted before persisting.
    pub needs_number: bool,
    pub document_type: DocumentType,
}

// =============================================================================
// Snapshot
// =============================================================================

/// The fields whose change makes a document dirty.
#[derive(Serialize)]
struct DirtyView<'a> {
    quote_details: &'a QuoteDetails,
    items: &'a [LineItem],
    document_type: DocumentType,
    discount: Rate,
}

// =============================================================================
// Editor
// =============================================================================

#[derive(Debug, Clone)]
pub struct DocumentEditor {
    id: String,
    document_type: DocumentType,
    document_number: Option<String>,
    /// Type the current number was minted for.
    numbered_type: Option<DocumentType>,
    content: DocumentContent,
    created_by: String,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    next_row_id: RowId,
    snapshot: String,
    is_saving: bool,
}

impl DocumentEditor {
    /// Starts a new, unnumbered document. A fresh document is clean.
    pub fn new(document_type: DocumentType, created_by: impl Into<String>) -> CoreResult<Self> {
        let mut editor = DocumentEditor {
            id: Uuid::new_v4().to_string(),
            document_type,
            document_number: None,
            numbered_type: None,
            content: DocumentContent::default(),
            created_by: created_by.into(),
            created_at: None,
            updated_at: None,
            next_row_id: 1,
            snapshot: String::new(),
            is_saving: false,
        };
        editor.snapshot = editor.serialize_view()?;
        Ok(editor)
    }

    /// Opens a persisted record. The loaded state is the clean baseline.
    pub fn from_record(record: DocumentRecord) -> CoreResult<Self> {
        let numbered_type = record.document_number.as_deref().map(|number| {
            parse_number(number)
                .map(|parsed| parsed.document_type())
                .unwrap_or(record.document_type)
        });
        let next_row_id = next_row_after(&record.content.items);

        let mut editor = DocumentEditor {
            id: record.id,
            document_type: record.document_type,
            document_number: record.document_number,
            numbered_type,
            content: record.content,
            created_by: record.created_by,
            created_at: record.created_at,
            updated_at: record.updated_at,
            next_row_id,
            snapshot: String::new(),
            is_saving: false,
        };
        editor.snapshot = editor.serialize_view()?;
        Ok(editor)
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn document_type(&self) -> DocumentType {
        self.document_type
    }

    pub fn document_number(&self) -> Option<&str> {
        self.document_number.as_deref()
    }

    pub fn content(&self) -> &DocumentContent {
        &self.content
    }

    pub fn items(&self) -> &[LineItem] {
        &self.content.items
    }

    pub fn quote_details(&self) -> &QuoteDetails {
        &self.content.quote_details
    }

    pub fn discount(&self) -> Rate {
        self.content.discount
    }

    pub fn created_by(&self) -> &str {
        &self.created_by
    }

    pub fn is_saving(&self) -> bool {
        self.is_saving
    }

    /// Term groups implied by the items plus legacy selections.
    pub fn term_groups(&self) -> Vec<String> {
        term_groups(&self.content.items, &self.content.legacy_term_groups)
    }

    pub fn technical_groups(&self) -> Vec<String> {
        technical_groups(&self.content.items, &self.content.legacy_technical_groups)
    }

    // -------------------------------------------------------------------------
    // Line Items
    // -------------------------------------------------------------------------

    /// Appends a snapshot of a catalog entry and returns its row id.
    pub fn add_from_catalog(&mut self, entry: &CatalogItem, quantity: Decimal) -> CoreResult<RowId> {
        validate_quantity(quantity)?;
        validate_unit_price(entry.price)?;

        let id = self.next_row_id;
        self.next_row_id += 1;
        self.content
            .items
            .push(LineItem::from_catalog(id, entry, quantity));
        Ok(id)
    }

    pub fn remove_item(&mut self, id: RowId) -> CoreResult<LineItem> {
        let index = self.position(id)?;
        Ok(self.content.items.remove(index))
    }

    /// Swaps the row with its predecessor. Returns `false` at the top.
    pub fn move_item_up(&mut self, id: RowId) -> CoreResult<bool> {
        let index = self.position(id)?;
        if index == 0 {
            return Ok(false);
        }
        self.content.items.swap(index - 1, index);
        Ok(true)
    }

    /// Swaps the row with its successor. Returns `false` at the bottom.
    pub fn move_item_down(&mut self, id: RowId) -> CoreResult<bool> {
        let index = self.position(id)?;
        if index + 1 >= self.content.items.len() {
            return Ok(false);
        }
        self.content.items.swap(index, index + 1);
        Ok(true)
    }

    pub fn set_quantity(&mut self, id: RowId, quantity: Decimal) -> CoreResult<()> {
        validate_quantity(quantity)?;
        let index = self.position(id)?;
        self.content.items[index].set_quantity(quantity);
        Ok(())
    }

    pub fn set_unit_price(&mut self, id: RowId, price: Money) -> CoreResult<()> {
        validate_unit_price(price)?;
        let index = self.position(id)?;
        self.content.items[index].set_unit_price(price);
        Ok(())
    }

    fn position(&self, id: RowId) -> CoreResult<usize> {
        self.content
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or(CoreError::ItemNotFound(id))
    }

    // -------------------------------------------------------------------------
    // Header
    // -------------------------------------------------------------------------

    pub fn set_discount(&mut self, discount: Rate) -> CoreResult<()> {
        validate_rate("discount", discount)?;
        self.content.discount = discount;
        Ok(())
    }

    /// Changing the type of a numbered document forces a new number on the
    /// next save.
    pub fn set_document_type(&mut self, document_type: DocumentType) {
        self.document_type = document_type;
    }

    pub fn set_quote_details(&mut self, details: QuoteDetails) {
        self.content.quote_details = details;
    }

    pub fn set_legacy_groups(&mut self, terms: Vec<String>, technicals: Vec<String>) {
        self.content.legacy_term_groups = terms;
        self.content.legacy_technical_groups = technicals;
    }

    // -------------------------------------------------------------------------
    // Dirty Tracking
    // -------------------------------------------------------------------------

    fn serialize_view(&self) -> CoreResult<String> {
        let view = DirtyView {
            quote_details: &self.content.quote_details,
            items: &self.content.items,
            document_type: self.document_type,
            discount: self.content.discount,
        };
        serde_json::to_string(&view).map_err(|e| CoreError::Snapshot(e.to_string()))
    }

    /// Whether anything tracked differs from the last clean baseline.
    /// A state that cannot be serialized counts as dirty.
    pub fn is_dirty(&self) -> bool {
        match self.serialize_view() {
            Ok(current) => current != self.snapshot,
            Err(_) => true,
        }
    }

    /// Saving takes precedence over dirty.
    pub fn navigation_guard(&self) -> NavigationGuard {
        if self.is_saving {
            NavigationGuard::BlockWhileSaving
        } else if self.is_dirty() {
            NavigationGuard::ConfirmUnsaved
        } else {
            NavigationGuard::Allow
        }
    }

    // -------------------------------------------------------------------------
    // Save Lifecycle
    // -------------------------------------------------------------------------

    /// Whether the next save must mint a number: the document has none yet,
    /// or its type changed since the number was minted.
    pub fn needs_number(&self) -> bool {
        match (&self.document_number, self.numbered_type) {
            (None, _) => true,
            (Some(_), Some(numbered)) => numbered != self.document_type,
            (Some(_), None) => false,
        }
    }

    pub fn begin_save(&mut self) -> CoreResult<SavePlan> {
        if self.is_saving {
            return Err(CoreError::SaveInProgress(self.id.clone()));
        }
        self.is_saving = true;
        Ok(SavePlan {
            needs_number: self.needs_number(),
            document_type: self.document_type,
        })
    }

    /// Adopts the persisted record and makes it the new clean baseline.
    pub fn complete_save(&mut self, persisted: DocumentRecord) -> CoreResult<()> {
        if !self.is_saving {
            return Err(CoreError::NoSaveInProgress(self.id.clone()));
        }

        self.id = persisted.id;
        self.document_type = persisted.document_type;
        if persisted.document_number.is_some() && persisted.document_number != self.document_number {
            self.numbered_type = Some(persisted.document_type);
        }
        self.document_number = persisted.document_number;
        self.next_row_id = self.next_row_id.max(next_row_after(&persisted.content.items));
        self.content = persisted.content;
        self.created_at = persisted.created_at;
        self.updated_at = persisted.updated_at;
        self.is_saving = false;
        self.snapshot = self.serialize_view()?;
        Ok(())
    }

    /// Ends a failed save. Edits stay dirty.
    pub fn abort_save(&mut self) -> CoreResult<()> {
        if !self.is_saving {
            return Err(CoreError::NoSaveInProgress(self.id.clone()));
        }
        self.is_saving = false;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Records
    // -------------------------------------------------------------------------

    /// The record as it stands, carrying the current number (if any).
    pub fn to_record(&self) -> DocumentRecord {
        DocumentRecord {
            id: self.id.clone(),
            record_type: ACCOUNT_RECORD_TYPE.to_string(),
            document_type: self.document_type,
            document_number: self.document_number.clone(),
            client_name: self.content.quote_details.client_name.trim().to_string(),
            content: self.content.clone(),
            created_by: self.created_by.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

fn next_row_after(items: &[LineItem]) -> RowId {
    items.iter().map(|item| item.id).max().map_or(1, |max| max + 1)
}

// =============================================================================
// Unit Tests
// =============================================================================
