//! # Record Adapter
//!
//! The only place where stored shapes are mapped to the canonical
//! [`DocumentRecord`].
//!
//! ## Shapes Accepted
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Postgres row      snake_case columns, content as JSONB                │
//! │  KV (current)      canonical snake_case JSON written by this crate     │
//! │  KV (older)        camelCase keys: documentType, quoteDetails,         │
//! │                    unitPrice, termsRefs, ...                           │
//! │                    discount as a percentage, numbers for amounts,      │
//! │                    address as one multi-line string,                   │
//! │                    epoch-millisecond timestamps                        │
//! │                                 │                                       │
//! │                                 ▼                                       │
//! │                          DocumentRecord                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Line totals are always recomputed on read, and row ids that are missing
//! or repeated are renumbered `1..=n` in stored order.

use std::collections::HashSet;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::FromRow;

use docket_core::numbering::parse_number;
use docket_core::{
    CatalogItem, ClauseEntry, DocumentContent, DocumentRecord, DocumentType, ItemKind, LineItem,
    Money, QuoteDetails, Rate, RowId, ServiceAttributes, ACCOUNT_RECORD_TYPE,
};

use crate::error::{DbError, DbResult};

// =============================================================================
// Document Type Keys
// =============================================================================

/// Storage key of a document type (`tax_invoice`).
pub fn document_type_key(document_type: DocumentType) -> &'static str {
    match document_type {
        DocumentType::Quotation => "quotation",
        DocumentType::TaxInvoice => "tax_invoice",
        DocumentType::ProformaInvoice => "proforma_invoice",
        DocumentType::PurchaseOrder => "purchase_order",
        DocumentType::DeliveryChallan => "delivery_challan",
    }
}

// =============================================================================
// Postgres Rows
// =============================================================================

#[derive(Debug, Clone, FromRow)]
pub struct DocumentRow {
    pub id: String,
    pub record_type: String,
    pub document_type: String,
    pub document_number: Option<String>,
    pub client_name: String,
    pub content: Json<Value>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentRow {
    pub fn into_record(self) -> DbResult<DocumentRecord> {
        let document_type = parse_document_type(&self.id, Some(&self.document_type), None)?;
        let content = content_from_json(&self.id, self.content.0)?;

        Ok(DocumentRecord {
            id: self.id,
            record_type: self.record_type,
            document_type,
            document_number: self.document_number,
            client_name: self.client_name,
            content,
            created_by: self.created_by,
            created_at: Some(self.created_at),
            updated_at: Some(self.updated_at),
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct CatalogItemRow {
    pub id: String,
    pub kind: String,
    pub description: String,
    pub unit: String,
    pub price: Decimal,
    pub hsn_code: String,
    pub term_groups: Vec<String>,
    pub technical_groups: Vec<String>,
    pub sampling_method: Option<String>,
    pub borehole_count: Option<i32>,
    pub measure_unit: Option<String>,
}

impl CatalogItemRow {
    pub fn into_item(self) -> DbResult<CatalogItem> {
        let kind = ItemKind::from_string(&self.kind)
            .ok_or_else(|| DbError::invalid_record(&self.id, format!("unknown kind '{}'", self.kind)))?;

        let has_attributes = self.sampling_method.is_some()
            || self.borehole_count.is_some()
            || self.measure_unit.is_some();
        let service_attributes = has_attributes.then(|| ServiceAttributes {
            sampling_method: self.sampling_method,
            borehole_count: self.borehole_count.and_then(|n| u32::try_from(n).ok()),
            measure_unit: self.measure_unit,
        });

        Ok(CatalogItem {
            id: self.id,
            kind,
            description: self.description,
            unit: self.unit,
            price: Money::from_decimal(self.price),
            hsn_code: self.hsn_code,
            term_groups: self.term_groups,
            technical_groups: self.technical_groups,
            service_attributes,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ClauseRow {
    pub id: String,
    pub group_type: String,
    pub text: String,
    pub sort_order: i32,
}

impl From<ClauseRow> for ClauseEntry {
    fn from(row: ClauseRow) -> Self {
        ClauseEntry {
            id: row.id,
            group_type: row.group_type,
            text: row.text,
            sort_order: row.sort_order,
        }
    }
}

// =============================================================================
// Key-Value JSON
// =============================================================================

#[derive(Debug, Deserialize)]
struct StoredRecord {
    id: Value,
    #[serde(default, alias = "recordType", alias = "type")]
    record_type: Option<String>,
    #[serde(default, alias = "documentType")]
    document_type: Option<String>,
    #[serde(default, alias = "documentNumber")]
    document_number: Option<String>,
    #[serde(default, alias = "clientName")]
    client_name: Option<String>,
    #[serde(default)]
    content: Value,
    #[serde(default, alias = "createdBy")]
    created_by: Option<String>,
    #[serde(default, alias = "createdAt", alias = "created")]
    created_at: Value,
    #[serde(default, alias = "updatedAt", alias = "updated")]
    updated_at: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StoredContent {
    #[serde(alias = "quoteDetails")]
    quote_details: StoredQuoteDetails,
    items: Vec<StoredLineItem>,
    discount_bps: Option<u32>,
    /// Percentage, older records only.
    discount: Option<Decimal>,
    #[serde(alias = "legacyTermGroups", alias = "selectedTerms")]
    legacy_term_groups: Vec<String>,
    #[serde(alias = "legacyTechnicalGroups", alias = "selectedTechnicals")]
    legacy_technical_groups: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StoredQuoteDetails {
    #[serde(alias = "clientId")]
    client_id: Value,
    #[serde(alias = "clientName")]
    client_name: String,
    #[serde(alias = "clientAddress")]
    client_address: Value,
    #[serde(alias = "kindAttention", alias = "kindAttn")]
    kind_attention: Option<String>,
    subject: Option<String>,
    #[serde(alias = "ref")]
    reference: Option<String>,
    #[serde(alias = "documentDate", alias = "date")]
    document_date: Option<String>,
    #[serde(alias = "paymentAmount")]
    payment_amount: Option<Decimal>,
    notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StoredLineItem {
    id: Value,
    #[serde(alias = "sourceId")]
    source_id: Value,
    kind: Option<String>,
    description: String,
    unit: String,
    #[serde(alias = "unitPrice", alias = "price")]
    unit_price: Decimal,
    quantity: Option<Decimal>,
    #[serde(alias = "hsnCode")]
    hsn_code: String,
    #[serde(alias = "termsRefs", alias = "termRefs")]
    term_refs: Vec<String>,
    #[serde(alias = "technicalRefs")]
    technical_refs: Vec<String>,
    #[serde(alias = "serviceAttributes")]
    service_attributes: Option<StoredServiceAttributes>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StoredServiceAttributes {
    #[serde(alias = "samplingMethod")]
    sampling_method: Option<String>,
    #[serde(alias = "boreholeCount")]
    borehole_count: Option<u32>,
    #[serde(alias = "measureUnit")]
    measure_unit: Option<String>,
}

/// Parses a KV record in any accepted shape.
pub fn record_from_str(raw: &str) -> DbResult<DocumentRecord> {
    let value: Value = serde_json::from_str(raw)?;
    record_from_json(value)
}

pub fn record_from_json(value: Value) -> DbResult<DocumentRecord> {
    let stored: StoredRecord = serde_json::from_value(value)?;
    let id = value_to_string(&stored.id)
        .ok_or_else(|| DbError::invalid_record("?", "missing id"))?;

    let document_type = parse_document_type(
        &id,
        stored.document_type.as_deref(),
        stored.document_number.as_deref(),
    )?;
    let content = content_from_json(&id, stored.content)?;
    let client_name = stored
        .client_name
        .unwrap_or_else(|| content.quote_details.client_name.clone());

    Ok(DocumentRecord {
        id,
        record_type: stored
            .record_type
            .unwrap_or_else(|| ACCOUNT_RECORD_TYPE.to_string()),
        document_type,
        document_number: stored.document_number.filter(|n| !n.trim().is_empty()),
        client_name,
        content,
        created_by: stored.created_by.unwrap_or_default(),
        created_at: parse_timestamp(&stored.created_at),
        updated_at: parse_timestamp(&stored.updated_at),
    })
}

/// Canonical JSON written to the KV store.
pub fn record_to_string(record: &DocumentRecord) -> DbResult<String> {
    Ok(serde_json::to_string(record)?)
}

/// Maps stored content of any shape to [`DocumentContent`].
pub fn content_from_json(id: &str, value: Value) -> DbResult<DocumentContent> {
    let stored: StoredContent = match value {
        Value::Null => StoredContent::default(),
        Value::String(raw) => serde_json::from_str(&raw)
            .map_err(|e| DbError::invalid_record(id, format!("content: {}", e)))?,
        other => serde_json::from_value(other)
            .map_err(|e| DbError::invalid_record(id, format!("content: {}", e)))?,
    };

    let discount = match (stored.discount_bps, stored.discount) {
        (Some(bps), _) => Rate::from_bps(bps),
        (None, Some(percent)) => rate_from_percent(percent),
        (None, None) => Rate::zero(),
    };

    Ok(DocumentContent {
        quote_details: quote_details(stored.quote_details),
        items: line_items(stored.items),
        discount,
        legacy_term_groups: stored.legacy_term_groups,
        legacy_technical_groups: stored.legacy_technical_groups,
    })
}

fn quote_details(stored: StoredQuoteDetails) -> QuoteDetails {
    let client_address = match stored.client_address {
        Value::String(text) => text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        Value::Array(lines) => lines.iter().filter_map(value_to_string).collect(),
        _ => Vec::new(),
    };

    QuoteDetails {
        client_id: value_to_string(&stored.client_id),
        client_name: stored.client_name,
        client_address,
        kind_attention: stored.kind_attention,
        subject: stored.subject,
        reference: stored.reference,
        document_date: stored.document_date.as_deref().and_then(parse_date),
        payment_amount: stored.payment_amount.map(Money::from_decimal),
        notes: stored.notes,
    }
}

fn line_items(stored: Vec<StoredLineItem>) -> Vec<LineItem> {
    let raw_ids: Vec<Option<RowId>> = stored.iter().map(|item| row_id(&item.id)).collect();
    let mut seen = HashSet::new();
    let ids_usable = raw_ids
        .iter()
        .all(|id| matches!(id, Some(id) if *id > 0 && seen.insert(*id)));

    stored
        .into_iter()
        .zip(raw_ids)
        .enumerate()
        .map(|(index, (item, raw_id))| {
            let id = match raw_id {
                Some(id) if ids_usable => id,
                _ => index as RowId + 1,
            };
            let kind = item
                .kind
                .as_deref()
                .and_then(|k| ItemKind::from_string(&k.to_ascii_lowercase()))
                .unwrap_or(ItemKind::Service);

            let mut line = LineItem {
                id,
                source_id: value_to_string(&item.source_id).unwrap_or_default(),
                kind,
                description: item.description,
                unit: item.unit,
                unit_price: Money::from_decimal(item.unit_price),
                quantity: item.quantity.unwrap_or(Decimal::ONE),
                line_total: Money::zero(),
                hsn_code: item.hsn_code,
                term_refs: item.term_refs,
                technical_refs: item.technical_refs,
                service_attributes: item.service_attributes.map(|a| ServiceAttributes {
                    sampling_method: a.sampling_method,
                    borehole_count: a.borehole_count,
                    measure_unit: a.measure_unit,
                }),
            };
            line.recompute_total();
            line
        })
        .collect()
}

// =============================================================================
// Field Helpers
// =============================================================================

/// Resolves the document type from its stored name, falling back to the
/// type code inside the document number.
fn parse_document_type(
    id: &str,
    stored: Option<&str>,
    number: Option<&str>,
) -> DbResult<DocumentType> {
    if let Some(raw) = stored.filter(|s| !s.trim().is_empty()) {
        return DocumentType::from_str(raw).map_err(|e| DbError::invalid_record(id, e.to_string()));
    }

    number
        .and_then(|n| parse_number(n).ok())
        .map(|n| n.document_type())
        .ok_or_else(|| DbError::invalid_record(id, "missing document type"))
}

fn rate_from_percent(percent: Decimal) -> Rate {
    let bps = (percent * Decimal::ONE_HUNDRED).round().to_u32().unwrap_or(0);
    Rate::from_bps(bps)
}

fn row_id(value: &Value) -> Option<RowId> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| raw.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn canonical() -> DocumentRecord {
        let mut content = DocumentContent::default();
        content.quote_details.client_name = "Acme Infra".to_string();
        content.quote_details.client_address = vec!["12 MG Road".into(), "Pune".into()];
        content.discount = Rate::from_bps(750);
        let mut item = LineItem {
            id: 4,
            source_id: "svc-1".into(),
            kind: ItemKind::Service,
            description: "Rotary drilling".into(),
            unit: "m".into(),
            unit_price: Money::from_paise(125_010),
            quantity: Decimal::new(25, 1),
            line_total: Money::zero(),
            hsn_code: "998341".into(),
            term_refs: vec!["Payment".into()],
            technical_refs: vec!["Drilling".into()],
            service_attributes: None,
        };
        item.recompute_total();
        content.items.push(item);

        DocumentRecord {
            id: "550e8400-e29b-41d4-a716-446655440000".into(),
            record_type: ACCOUNT_RECORD_TYPE.into(),
            document_type: DocumentType::TaxInvoice,
            document_number: Some("ORG/2026/10/TI/002".into()),
            client_name: "Acme Infra".into(),
            content,
            created_by: "ops@example.com".into(),
            created_at: DateTime::from_timestamp(1_790_000_000, 0),
            updated_at: DateTime::from_timestamp(1_790_000_100, 0),
        }
    }

    #[test]
    fn test_canonical_round_trip() {
        let record = canonical();
        let raw = record_to_string(&record).unwrap();
        assert!(raw.contains("\"discount_bps\":750"));
        assert!(raw.contains("\"tax_invoice\""));
        assert_eq!(record_from_str(&raw).unwrap(), record);
    }

    #[test]
    fn test_camel_case_legacy_record() {
        let raw = json!({
            "id": "legacy-1",
            "type": "account",
            "documentType": "Tax Invoice",
            "documentNumber": "ORG/2025/04/TI/017",
            "clientName": "Old Client",
            "createdBy": "admin@example.com",
            "createdAt": 1_700_000_000_000_i64,
            "content": {
                "quoteDetails": {
                    "clientName": "Old Client",
                    "clientAddress": "Plot 4\nMIDC\n\nNashik",
                    "kindAttn": "Site Engineer",
                    "date": "2025-04-09T10:00:00.000Z",
                    "paymentAmount": 5000
                },
                "items": [
                    {"id": 1_700_000_000_001_u64, "sourceId": 17, "kind": "Test",
                     "description": "Cube test", "unit": "no", "unitPrice": 450.5,
                     "quantity": 3, "lineTotal": 1, "termsRefs": ["Payment"]},
                    {"id": 1_700_000_000_002_u64, "description": "Core cutting",
                     "price": "1200", "quantity": "2"}
                ],
                "discount": 12.5,
                "selectedTerms": ["General"]
            }
        });

        let record = record_from_json(raw).unwrap();
        assert_eq!(record.document_type, DocumentType::TaxInvoice);
        assert_eq!(record.record_type, "account");
        assert_eq!(record.created_at, DateTime::from_timestamp_millis(1_700_000_000_000));
        assert_eq!(record.updated_at, None);

        let content = &record.content;
        assert_eq!(content.discount, Rate::from_bps(1_250));
        assert_eq!(content.legacy_term_groups, vec!["General".to_string()]);
        assert_eq!(content.quote_details.client_address, vec!["Plot 4", "MIDC", "Nashik"]);
        assert_eq!(content.quote_details.kind_attention.as_deref(), Some("Site Engineer"));
        assert_eq!(content.quote_details.document_date, NaiveDate::from_ymd_opt(2025, 4, 9));
        assert_eq!(content.quote_details.payment_amount, Some(Money::from_rupees(5_000)));

        let first = &content.items[0];
        assert_eq!(first.id, 1_700_000_000_001);
        assert_eq!(first.source_id, "17");
        assert_eq!(first.kind, ItemKind::Test);
        assert_eq!(first.line_total, Money::from_paise(135_150));
        assert_eq!(first.term_refs, vec!["Payment".to_string()]);

        let second = &content.items[1];
        assert_eq!(second.line_total, Money::from_rupees(2_400));
        assert_eq!(second.kind, ItemKind::Service);
    }

    #[test]
    fn test_missing_or_repeated_row_ids_are_renumbered() {
        let content = content_from_json(
            "x",
            json!({"items": [
                {"id": 7, "unitPrice": 1, "quantity": 1},
                {"id": 7, "unitPrice": 1, "quantity": 1},
                {"unitPrice": 1, "quantity": 1}
            ]}),
        )
        .unwrap();
        let ids: Vec<RowId> = content.items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_type_falls_back_to_number_code() {
        let record = record_from_json(json!({
            "id": "n-1",
            "documentNumber": "ORG/2026/01/PO/003"
        }))
        .unwrap();
        assert_eq!(record.document_type, DocumentType::PurchaseOrder);
    }

    #[test]
    fn test_unknown_type_is_invalid() {
        let err = record_from_json(json!({"id": "bad", "documentType": "receipt"})).unwrap_err();
        assert!(matches!(err, DbError::InvalidRecord { .. }));

        let err = record_from_json(json!({"id": "bad"})).unwrap_err();
        assert!(matches!(err, DbError::InvalidRecord { .. }));
    }

    #[test]
    fn test_content_stored_as_string() {
        let content = content_from_json("s", json!("{\"discount_bps\": 900}")).unwrap();
        assert_eq!(content.discount, Rate::from_bps(900));
        assert!(content_from_json("s", Value::Null).unwrap().items.is_empty());
    }

    #[test]
    fn test_catalog_row_mapping() {
        let row = CatalogItemRow {
            id: "svc-1".into(),
            kind: "service".into(),
            description: "SPT".into(),
            unit: "no".into(),
            price: Decimal::new(150_000, 2),
            hsn_code: "998341".into(),
            term_groups: vec!["Payment".into()],
            technical_groups: vec![],
            sampling_method: Some("Split spoon".into()),
            borehole_count: Some(3),
            measure_unit: None,
        };
        let mut bad = row.clone();
        bad.kind = "gadget".into();
        assert!(bad.into_item().is_err());

        let item = row.into_item().unwrap();
        assert_eq!(item.price, Money::from_rupees(1_500));
        assert_eq!(item.service_attributes.unwrap().borehole_count, Some(3));
    }

    #[test]
    fn test_document_type_keys_parse_back() {
        for t in DocumentType::ALL {
            assert_eq!(DocumentType::from_str(document_type_key(t)).unwrap(), t);
        }
    }
}
