//! # Printed Layout
//!
//! Combines the three paginated streams, totals and footers into the page
//! sequence of a printed document.
//!
//! ## Page Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1 .. I        item pages      (summary block on page I)                │
//! │  I + 1         bank details page                                        │
//! │  I + 2 ..      term pages      (at least one, possibly empty)           │
//! │  ..  N         technical pages (zero or more)                           │
//! │                                                                         │
//! │  N = item_pages + 1 + term_pages + technical_pages                      │
//! │  footer: "Quotation #ORG/2026/10/QN/004 | Page 3 of 5"                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;

use crate::editor::DocumentEditor;
use crate::money::Money;
use crate::pagination::{
    paginate_items, paginate_technicals, paginate_terms, technical_groups, term_groups, GroupEntry,
    Page, PaginationConfig,
};
use crate::totals::{balance_due, compute_with_config, TaxConfig, Totals};
use crate::types::{ClauseEntry, DocumentRecord, DocumentType, LineItem};
use crate::words::amount_in_words;

/// Footer placeholder before a number has been minted.
pub const PENDING_NUMBER: &str = "Pending";

/// `"{label} #{number} | Page {n} of {total}"`
pub fn footer(document_type: DocumentType, number: Option<&str>, page: usize, total: usize) -> String {
    format!(
        "{} #{} | Page {} of {}",
        document_type.label(),
        number.unwrap_or(PENDING_NUMBER),
        page,
        total
    )
}

/// Totals block printed under the last item row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub totals: Totals,
    pub amount_in_words: String,
    /// Tax Invoices with a recorded payment only.
    pub balance_due: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "section", rename_all = "snake_case")]
pub enum PageBody {
    Items {
        /// Printed serial of the first row on this page.
        first_serial: usize,
        rows: Page<LineItem>,
        summary: Option<Summary>,
    },
    BankDetails,
    Terms(Page<GroupEntry>),
    Technicals(Page<GroupEntry>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrintedPage {
    /// Absolute page number within the document.
    pub number: usize,
    pub footer: String,
    pub body: PageBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentLayout {
    pub document_type: DocumentType,
    pub document_number: Option<String>,
    pub totals: Totals,
    pub pages: Vec<PrintedPage>,
}

impl DocumentLayout {
    /// Lays out a record against the clause catalogs.
    pub fn assemble(
        record: &DocumentRecord,
        term_catalog: &[ClauseEntry],
        technical_catalog: &[ClauseEntry],
        pagination: &PaginationConfig,
        tax: TaxConfig,
    ) -> Self {
        let content = &record.content;

        let item_pages = paginate_items(&content.items, pagination.items());
        let term_pages = paginate_terms(
            &term_groups(&content.items, &content.legacy_term_groups),
            term_catalog,
            pagination.term_groups(),
        );
        let technical_pages = paginate_technicals(
            &technical_groups(&content.items, &content.legacy_technical_groups),
            technical_catalog,
            pagination.technical_groups(),
        );

        let totals = compute_with_config(&content.items, content.discount, tax);
        let summary = Summary {
            totals,
            amount_in_words: amount_in_words(totals.grand_total),
            balance_due: match content.quote_details.payment_amount {
                Some(paid) if record.document_type.tracks_payment() => {
                    Some(balance_due(totals.grand_total, paid))
                }
                _ => None,
            },
        };

        let item_page_count = item_pages.len();
        let mut bodies: Vec<PageBody> = Vec::new();
        let mut serial = 1;
        for (index, page) in item_pages.into_iter().enumerate() {
            let rows_on_page = page.content.len();
            bodies.push(PageBody::Items {
                first_serial: serial,
                rows: page,
                summary: (index + 1 == item_page_count).then(|| summary.clone()),
            });
            serial += rows_on_page;
        }
        bodies.push(PageBody::BankDetails);
        bodies.extend(term_pages.into_iter().map(PageBody::Terms));
        bodies.extend(technical_pages.into_iter().map(PageBody::Technicals));

        let total = bodies.len();
        let number = record.document_number.as_deref();
        let pages = bodies
            .into_iter()
            .enumerate()
            .map(|(i, body)| PrintedPage {
                number: i + 1,
                footer: footer(record.document_type, number, i + 1, total),
                body,
            })
            .collect();

        DocumentLayout {
            document_type: record.document_type,
            document_number: record.document_number.clone(),
            totals,
            pages,
        }
    }

    /// Lays out the editor's current state.
    pub fn for_editor(
        editor: &DocumentEditor,
        term_catalog: &[ClauseEntry],
        technical_catalog: &[ClauseEntry],
        pagination: &PaginationConfig,
        tax: TaxConfig,
    ) -> Self {
        Self::assemble(&editor.to_record(), term_catalog, technical_catalog, pagination, tax)
    }

    pub fn total_pages(&self) -> usize {
        self.pages.len()
    }

    /// The summary block, found on the last item page.
    pub fn summary(&self) -> Option<&Summary> {
        self.pages.iter().find_map(|page| match &page.body {
            PageBody::Items {
                summary: Some(summary),
                ..
            } => Some(summary),
            _ => None,
        })
    }
}
