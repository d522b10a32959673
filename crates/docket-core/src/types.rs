//! # Domain Types
//!
//! Core domain types used throughout Docket.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  CatalogItem    │   │ DocumentRecord  │   │  ClauseEntry    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  id             │       │
//! │  │  kind           │   │  document_type  │   │  group_type     │       │
//! │  │  price          │   │  document_number│   │  text           │       │
//! │  │  term_groups    │   │  content ───────┼─┐ │  sort_order     │       │
//! │  └────────┬────────┘   └─────────────────┘ │ └─────────────────┘       │
//! │           │ snapshot                       │                            │
//! │           ▼                                ▼                            │
//! │  ┌─────────────────┐   ┌─────────────────────────────┐                 │
//! │  │    LineItem     │◄──│ DocumentContent             │                 │
//! │  │  unit_price     │   │  quote_details, items,      │                 │
//! │  │  quantity       │   │  discount, legacy groups    │                 │
//! │  │  line_total     │   └─────────────────────────────┘                 │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every document has:
//! - `id`: UUID v4 for new documents (older records keep their own keys) - immutable, used for storage
//! - `document_number`: `ORG/YYYY/MM/TC/SEQ` - human-readable, minted on first save

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, ValidationError};
use crate::money::Money;
use crate::numbering::DocumentNumber;

// =============================================================================
// Rate
// =============================================================================

/// A percentage represented in basis points (bps).
///
/// 1 basis point = 0.01%, so `900` = 9% (one half of 18% GST).
/// Used for CGST, SGST and document discounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rate(u32);

impl Rate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Creates a rate from a percentage (configuration files carry `9.0`).
    ///
    /// Only `0.0..=100.0` is accepted; negative, non-finite or larger
    /// values are reported against `field` instead of being clamped.
    pub fn from_percentage(field: &str, pct: f64) -> Result<Self, ValidationError> {
        if !pct.is_finite() {
            return Err(ValidationError::InvalidFormat {
                field: field.to_string(),
                reason: "must be a number".to_string(),
            });
        }
        if !(0.0..=100.0).contains(&pct) {
            return Err(ValidationError::OutOfRange {
                field: field.to_string(),
                min: 0,
                max: 100,
            });
        }
        Ok(Rate((pct * 100.0).round() as u32))
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Exact multiplier: `bps / 10000`.
    pub fn fraction(&self) -> Decimal {
        Decimal::new(self.0 as i64, 4)
    }

    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate::zero()
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pct = Decimal::from_u32(self.0).unwrap_or_default() / Decimal::ONE_HUNDRED;
        write!(f, "{}%", pct.normalize())
    }
}

// =============================================================================
// Document Type
// =============================================================================

/// The five document kinds the console can produce.
///
/// Each kind carries a fixed two-letter code used inside document numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Quotation,
    TaxInvoice,
    ProformaInvoice,
    PurchaseOrder,
    DeliveryChallan,
}

impl DocumentType {
    pub const ALL: [DocumentType; 5] = [
        DocumentType::Quotation,
        DocumentType::TaxInvoice,
        DocumentType::ProformaInvoice,
        DocumentType::PurchaseOrder,
        DocumentType::DeliveryChallan,
    ];

    /// Two-letter code embedded in document numbers.
    pub const fn code(&self) -> &'static str {
        match self {
            DocumentType::Quotation => "QN",
            DocumentType::TaxInvoice => "TI",
            DocumentType::ProformaInvoice => "PI",
            DocumentType::PurchaseOrder => "PO",
            DocumentType::DeliveryChallan => "DC",
        }
    }

    /// Printed title, also used in page footers.
    pub const fn label(&self) -> &'static str {
        match self {
            DocumentType::Quotation => "Quotation",
            DocumentType::TaxInvoice => "Tax Invoice",
            DocumentType::ProformaInvoice => "Proforma Invoice",
            DocumentType::PurchaseOrder => "Purchase Order",
            DocumentType::DeliveryChallan => "Delivery Challan",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        DocumentType::ALL
            .into_iter()
            .find(|t| t.code().eq_ignore_ascii_case(code))
    }

    /// Whether a recorded payment turns into a balance-due line.
    pub const fn tracks_payment(&self) -> bool {
        matches!(self, DocumentType::TaxInvoice)
    }
}

impl Default for DocumentType {
    fn default() -> Self {
        DocumentType::Quotation
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Accepts a code (`QN`), a label (`Tax Invoice`) or a snake_case name
/// (`tax_invoice`).
impl FromStr for DocumentType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(t) = DocumentType::from_code(s) {
            return Ok(t);
        }

        let normalized: String = s
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        DocumentType::ALL
            .into_iter()
            .find(|t| t.label().replace(' ', "").to_ascii_lowercase() == normalized)
            .ok_or_else(|| CoreError::UnknownDocumentType(s.to_string()))
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Whether a catalog entry is a field service or a laboratory test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Service,
    Test,
}

impl ItemKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Service => "service",
            ItemKind::Test => "test",
        }
    }

    pub fn from_string(s: &str) -> Option<Self> {
        match s {
            "service" => Some(ItemKind::Service),
            "test" => Some(ItemKind::Test),
            _ => None,
        }
    }
}

/// Extra attributes carried only by field services (drilling, sampling).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ServiceAttributes {
    pub sampling_method: Option<String>,
    pub borehole_count: Option<u32>,
    pub measure_unit: Option<String>,
}

/// A priced service or test from the shared catalog (read-only here).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CatalogItem {
    pub id: String,
    pub kind: ItemKind,
    pub description: String,
    pub unit: String,
    pub price: Money,
    pub hsn_code: String,
    /// Term groups this entry brings into a document.
    pub term_groups: Vec<String>,
    /// Technical-clause groups this entry brings into a document.
    pub technical_groups: Vec<String>,
    pub service_attributes: Option<ServiceAttributes>,
}

/// Which clause catalog a [`ClauseEntry`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ClauseKind {
    Term,
    Technical,
}

impl ClauseKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ClauseKind::Term => "term",
            ClauseKind::Technical => "technical",
        }
    }
}

/// One term or technical clause. Documents reference clause *groups*,
/// never individual entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ClauseEntry {
    pub id: String,
    pub group_type: String,
    pub text: String,
    pub sort_order: i32,
}

// =============================================================================
// Line Item
// =============================================================================

/// Row identifier of a line item, unique and monotonic within one document.
pub type RowId = u64;

/// A billable row on a document.
///
/// Uses the snapshot pattern: catalog data is frozen when the row is added.
///
/// ## Invariant
/// `line_total == round(unit_price × quantity, 2)`; every mutation goes
/// through [`LineItem::set_quantity`] / [`LineItem::set_unit_price`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    pub id: RowId,
    /// Catalog entry this row was created from.
    pub source_id: String,
    pub kind: ItemKind,
    pub description: String,
    pub unit: String,
    pub unit_price: Money,
    #[ts(type = "string")]
    pub quantity: Decimal,
    pub line_total: Money,
    pub hsn_code: String,
    pub term_refs: Vec<String>,
    pub technical_refs: Vec<String>,
    pub service_attributes: Option<ServiceAttributes>,
}

impl LineItem {
    /// Snapshots a catalog entry into a new row.
    pub fn from_catalog(id: RowId, entry: &CatalogItem, quantity: Decimal) -> Self {
        LineItem {
            id,
            source_id: entry.id.clone(),
            kind: entry.kind,
            description: entry.description.clone(),
            unit: entry.unit.clone(),
            unit_price: entry.price,
            quantity,
            line_total: entry.price.multiply_quantity(quantity),
            hsn_code: entry.hsn_code.clone(),
            term_refs: dedup_tags(&entry.term_groups),
            technical_refs: dedup_tags(&entry.technical_groups),
            service_attributes: entry.service_attributes.clone(),
        }
    }

    pub fn set_quantity(&mut self, quantity: Decimal) {
        self.quantity = quantity;
        self.recompute_total();
    }

    pub fn set_unit_price(&mut self, unit_price: Money) {
        self.unit_price = unit_price;
        self.recompute_total();
    }

    /// Re-derives `line_total` from price and quantity.
    pub fn recompute_total(&mut self) {
        self.line_total = self.unit_price.multiply_quantity(self.quantity);
    }

    /// Whether the stored total still satisfies the line-total rule
    /// (records loaded from storage are checked with this).
    pub fn has_consistent_total(&self) -> bool {
        self.line_total == self.unit_price.multiply_quantity(self.quantity)
    }
}

fn dedup_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        if !out.contains(tag) {
            out.push(tag.clone());
        }
    }
    out
}

// =============================================================================
// Document
// =============================================================================

/// Record type under which documents live in the record store.
pub const ACCOUNT_RECORD_TYPE: &str = "account";

/// Client and header block printed on the first page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuoteDetails {
    pub client_id: Option<String>,
    pub client_name: String,
    pub client_address: Vec<String>,
    pub kind_attention: Option<String>,
    pub subject: Option<String>,
    pub reference: Option<String>,
    #[ts(as = "Option<String>")]
    pub document_date: Option<NaiveDate>,
    /// Amount already received (Tax Invoice only).
    pub payment_amount: Option<Money>,
    pub notes: Option<String>,
}

/// The persisted body of a document. Pages are never stored; they are
/// recomputed from this.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DocumentContent {
    pub quote_details: QuoteDetails,
    pub items: Vec<LineItem>,
    /// Stored in basis points. Older records carry a percentage under
    /// `discount`; the storage adapter converts those.
    #[serde(rename = "discount_bps")]
    pub discount: Rate,
    /// Term groups picked by hand on older documents.
    #[serde(default)]
    pub legacy_term_groups: Vec<String>,
    /// Technical groups picked by hand on older documents.
    #[serde(default)]
    pub legacy_technical_groups: Vec<String>,
}

/// Canonical document record. Every storage backend maps to and from this
/// shape in `docket-db`'s adapter layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DocumentRecord {
    pub id: String,
    pub record_type: String,
    pub document_type: DocumentType,
    /// `None` until the first successful save.
    pub document_number: Option<String>,
    pub client_name: String,
    pub content: DocumentContent,
    pub created_by: String,
    /// Assigned by storage on first insert only.
    #[ts(as = "Option<String>")]
    pub created_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A previously issued number, as seen by the allocator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedNumber {
    pub document_type: DocumentType,
    pub number: String,
}

impl IssuedNumber {
    /// Extracts the issued number of a record, if it has one.
    pub fn from_record(record: &DocumentRecord) -> Option<Self> {
        record.document_number.as_ref().map(|number| IssuedNumber {
            document_type: record.document_type,
            number: number.clone(),
        })
    }

    /// Rebuilds an issued number from its text, taking the type from the
    /// type code. Free-form numbers from older records yield `None`.
    pub fn parse(number: &str) -> Option<Self> {
        let parsed: DocumentNumber = number.parse().ok()?;
        Some(IssuedNumber {
            document_type: parsed.document_type(),
            number: number.to_string(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_entry() -> CatalogItem {
        CatalogItem {
            id: "svc-1".to_string(),
            kind: ItemKind::Service,
            description: "Rotary drilling".to_string(),
            unit: "m".to_string(),
            price: Money::from_paise(125_010),
            hsn_code: "998341".to_string(),
            term_groups: vec!["Payment".into(), "Site".into(), "Payment".into()],
            technical_groups: vec!["Drilling".into()],
            service_attributes: Some(ServiceAttributes {
                sampling_method: Some("SPT".into()),
                borehole_count: Some(2),
                measure_unit: Some("m".into()),
            }),
        }
    }

    #[test]
    fn test_rate_from_percentage_rejects_bad_input() {
        assert!(matches!(
            Rate::from_percentage("discount", -5.0),
            Err(ValidationError::OutOfRange { ref field, .. }) if field == "discount"
        ));
        assert!(matches!(
            Rate::from_percentage("cgst", 150.0),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(matches!(
            Rate::from_percentage("sgst", f64::NAN),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(Rate::from_percentage("sgst", f64::INFINITY).is_err());
    }

    #[test]
    fn test_rate_from_percentage() {
        assert_eq!(Rate::from_percentage("cgst", 9.0).unwrap().bps(), 900);
        assert_eq!(Rate::from_percentage("discount", 12.5).unwrap().bps(), 1250);
        assert_eq!(Rate::from_percentage("discount", 100.0).unwrap().bps(), 10_000);
        assert_eq!(Rate::from_bps(900).fraction(), Decimal::new(9, 2));
        assert_eq!(Rate::from_bps(1250).to_string(), "12.5%");
    }

    #[test]
    fn test_document_type_codes() {
        let codes: Vec<&str> = DocumentType::ALL.iter().map(|t| t.code()).collect();
        assert_eq!(codes, vec!["QN", "TI", "PI", "PO", "DC"]);
        assert_eq!(DocumentType::from_code("ti"), Some(DocumentType::TaxInvoice));
        assert_eq!(DocumentType::from_code("XX"), None);
    }

    #[test]
    fn test_document_type_from_str() {
        assert_eq!("QN".parse::<DocumentType>().unwrap(), DocumentType::Quotation);
        assert_eq!(
            "Proforma Invoice".parse::<DocumentType>().unwrap(),
            DocumentType::ProformaInvoice
        );
        assert_eq!(
            "delivery_challan".parse::<DocumentType>().unwrap(),
            DocumentType::DeliveryChallan
        );
        assert!("receipt".parse::<DocumentType>().is_err());
    }

    #[test]
    fn test_line_item_snapshot_and_total() {
        let mut item = LineItem::from_catalog(1, &catalog_entry(), Decimal::new(2, 0));
        assert_eq!(item.line_total, Money::from_paise(250_020));
        assert_eq!(item.term_refs, vec!["Payment".to_string(), "Site".to_string()]);

        item.set_quantity(Decimal::new(15, 1));
        assert_eq!(item.line_total, Money::from_paise(187_515));

        item.set_unit_price(Money::from_rupees(100));
        assert_eq!(item.line_total, Money::from_rupees(150));
        assert!(item.has_consistent_total());

        item.line_total = Money::from_rupees(1);
        assert!(!item.has_consistent_total());
    }

    #[test]
    fn test_issued_number_from_record() {
        let mut record = DocumentRecord {
            id: "a".into(),
            record_type: ACCOUNT_RECORD_TYPE.into(),
            document_type: DocumentType::Quotation,
            document_number: None,
            client_name: "Acme".into(),
            content: DocumentContent::default(),
            created_by: "ops@example.com".into(),
            created_at: None,
            updated_at: None,
        };
        assert!(IssuedNumber::from_record(&record).is_none());

        record.document_number = Some("ORG/2026/10/QN/001".into());
        let issued = IssuedNumber::from_record(&record).unwrap();
        assert_eq!(issued.document_type, DocumentType::Quotation);
        assert_eq!(issued.number, "ORG/2026/10/QN/001");
    }

    #[test]
    fn test_issued_number_parse_takes_type_from_code() {
        let issued = IssuedNumber::parse("ORG/2026/10/TI/004").unwrap();
        assert_eq!(issued.document_type, DocumentType::TaxInvoice);
        assert_eq!(issued.number, "ORG/2026/10/TI/004");
        assert!(IssuedNumber::parse("INV-17").is_none());
    }
}
