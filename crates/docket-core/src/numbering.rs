//! # Document Numbering
//!
//! Mints human-readable document numbers of the form
//! `ORG/YYYY/MM/TC/SEQ`, where `SEQ` counts per document type and month.
//!
//! ## Allocation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  next_number(Quotation, existing, 2026-10-17)                           │
//! │                                                                         │
//! │  prefix = "ORG/2026/10/QN/"                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  existing ──► keep type == Quotation && starts_with(prefix)             │
//! │       │         ORG/2026/10/QN/001  ✓                                   │
//! │       │         ORG/2026/10/QN/003  ✓                                   │
//! │       │         ORG/2026/10/TI/007  ✗ (other type)                      │
//! │       │         ORG/2026/09/QN/012  ✗ (other month)                     │
//! │       ▼                                                                 │
//! │  max SEQ = 3  ──►  ORG/2026/10/QN/004   (max + 1, not count + 1)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The allocator is a pure function of its inputs. It neither reserves nor
//! locks a number: the caller persists the minted number together with the
//! document, and storage uniqueness catches concurrent saves that minted the
//! same value.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};

use crate::error::{CoreError, CoreResult};
use crate::types::{DocumentType, IssuedNumber};
use crate::DEFAULT_ORG_PREFIX;

/// Minimum width of the zero-padded sequence. Wider values are allowed.
pub const SEQ_WIDTH: usize = 3;

// =============================================================================
// Number Scope
// =============================================================================

/// The `(type, year, month)` triple a sequence counts within.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NumberScope {
    pub document_type: DocumentType,
    pub year: i32,
    pub month: u32,
}

impl NumberScope {
    /// Scope of a document of `document_type` created on `date`.
    pub fn new(document_type: DocumentType, date: NaiveDate) -> Self {
        NumberScope {
            document_type,
            year: date.year(),
            month: date.month(),
        }
    }

    /// `"{org}/{YYYY}/{MM}/{TC}/"`
    pub fn prefix(&self, org: &str) -> String {
        format!(
            "{}/{:04}/{:02}/{}/",
            org,
            self.year,
            self.month,
            self.document_type.code()
        )
    }
}

// =============================================================================
// Document Number
// =============================================================================

/// A parsed document number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentNumber {
    org: String,
    scope: NumberScope,
    seq: u32,
}

impl DocumentNumber {
    pub fn new(org: impl Into<String>, scope: NumberScope, seq: u32) -> Self {
        DocumentNumber {
            org: org.into(),
            scope,
            seq,
        }
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    pub fn scope(&self) -> NumberScope {
        self.scope
    }

    pub fn document_type(&self) -> DocumentType {
        self.scope.document_type
    }

    pub fn seq(&self) -> u32 {
        self.seq
    }
}

impl fmt::Display for DocumentNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:0width$}",
            self.scope.prefix(&self.org),
            self.seq,
            width = SEQ_WIDTH
        )
    }
}

/// Parses `ORG/YYYY/MM/TC/SEQ`. The organisation segment may itself
/// contain slashes; the last four segments are fixed.
impl FromStr for DocumentNumber {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: &str| CoreError::MalformedNumber {
            value: s.to_string(),
            reason: reason.to_string(),
        };

        let mut parts = s.trim().rsplitn(5, '/');
        let seq = parts.next().ok_or_else(|| malformed("missing sequence"))?;
        let code = parts.next().ok_or_else(|| malformed("missing type code"))?;
        let month = parts.next().ok_or_else(|| malformed("missing month"))?;
        let year = parts.next().ok_or_else(|| malformed("missing year"))?;
        let org = parts.next().ok_or_else(|| malformed("missing organisation"))?;

        if org.is_empty() {
            return Err(malformed("missing organisation"));
        }

        let document_type =
            DocumentType::from_code(code).ok_or_else(|| malformed("unknown type code"))?;
        let year: i32 = year.parse().map_err(|_| malformed("year is not a number"))?;
        let month: u32 = month
            .parse()
            .ok()
            .filter(|m| (1..=12).contains(m))
            .ok_or_else(|| malformed("month must be 01-12"))?;
        let seq = parse_seq(seq).ok_or_else(|| malformed("sequence is not a number"))?;

        Ok(DocumentNumber {
            org: org.to_string(),
            scope: NumberScope {
                document_type,
                year,
                month,
            },
            seq,
        })
    }
}

fn parse_seq(raw: &str) -> Option<u32> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

// =============================================================================
// Allocator
// =============================================================================

/// Computes the next number for a scope from a snapshot of issued numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberAllocator {
    org: String,
}

impl NumberAllocator {
    pub fn new(org: impl Into<String>) -> Self {
        NumberAllocator { org: org.into() }
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    /// Returns the next number for `document_type` in the month of `today`.
    ///
    /// `existing` is the full set of issued numbers of every type; filtering
    /// happens here. Entries whose suffix is not a plain integer are ignored.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::NaiveDate;
    /// use docket_core::numbering::NumberAllocator;
    /// use docket_core::types::{DocumentType, IssuedNumber};
    ///
    /// let today = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
    /// let existing = vec![IssuedNumber {
    ///     document_type: DocumentType::Quotation,
    ///     number: "ORG/2026/10/QN/001".to_string(),
    /// }];
    ///
    /// let next = NumberAllocator::default()
    ///     .next_number(DocumentType::Quotation, &existing, today);
    /// assert_eq!(next.to_string(), "ORG/2026/10/QN/002");
    /// ```
    pub fn next_number(
        &self,
        document_type: DocumentType,
        existing: &[IssuedNumber],
        today: NaiveDate,
    ) -> DocumentNumber {
        let scope = NumberScope::new(document_type, today);
        let prefix = scope.prefix(&self.org);

        // Numeric max equals the lexicographic max while every SEQ has the
        // same width, and stays correct once a month passes 999.
        let highest = existing
            .iter()
            .filter(|issued| issued.document_type == document_type)
            .filter_map(|issued| issued.number.strip_prefix(prefix.as_str()))
            .filter_map(parse_seq)
            .max();

        let seq = highest.map_or(1, |max| max.saturating_add(1));
        DocumentNumber::new(self.org.clone(), scope, seq)
    }

    /// First number of the scope (`SEQ = 1`).
    ///
    /// Used when the issued numbers cannot be read. The result may collide
    /// with a number issued earlier in the month, so callers must surface
    /// the degradation.
    pub fn first_in_scope(&self, document_type: DocumentType, today: NaiveDate) -> DocumentNumber {
        DocumentNumber::new(self.org.clone(), NumberScope::new(document_type, today), 1)
    }
}

impl Default for NumberAllocator {
    fn default() -> Self {
        NumberAllocator::new(DEFAULT_ORG_PREFIX)
    }
}

/// Parses a stored number. Legacy free-form values yield `MalformedNumber`.
pub fn parse_number(raw: &str) -> CoreResult<DocumentNumber> {
    raw.parse()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    fn issued(document_type: DocumentType, number: &str) -> IssuedNumber {
        IssuedNumber {
            document_type,
            number: number.to_string(),
        }
    }

    #[test]
    fn test_first_number_of_month() {
        let next = NumberAllocator::default().next_number(DocumentType::Quotation, &[], today());
        assert_eq!(next.to_string(), "ORG/2026/10/QN/001");
    }

    #[test]
    fn test_takes_max_not_count() {
        let existing = vec![
            issued(DocumentType::Quotation, "ORG/2026/10/QN/001"),
            issued(DocumentType::Quotation, "ORG/2026/10/QN/003"),
        ];
        let next =
            NumberAllocator::default().next_number(DocumentType::Quotation, &existing, today());
        assert_eq!(next.to_string(), "ORG/2026/10/QN/004");
    }

    #[test]
    fn test_scope_isolation() {
        let existing = vec![
            issued(DocumentType::TaxInvoice, "ORG/2026/10/TI/009"),
            issued(DocumentType::Quotation, "ORG/2026/09/QN/041"),
            issued(DocumentType::Quotation, "ORG/2025/10/QN/077"),
        ];
        let allocator = NumberAllocator::default();

        let quotation = allocator.next_number(DocumentType::Quotation, &existing, today());
        assert_eq!(quotation.to_string(), "ORG/2026/10/QN/001");

        let invoice = allocator.next_number(DocumentType::TaxInvoice, &existing, today());
        assert_eq!(invoice.to_string(), "ORG/2026/10/TI/010");
    }

    #[test]
    fn test_type_field_must_match_prefix() {
        // A record whose type field disagrees with its number is not counted.
        let existing = vec![issued(DocumentType::TaxInvoice, "ORG/2026/10/QN/005")];
        let next =
            NumberAllocator::default().next_number(DocumentType::Quotation, &existing, today());
        assert_eq!(next.seq(), 1);
    }

    #[test]
    fn test_deterministic() {
        let existing = vec![issued(DocumentType::Quotation, "ORG/2026/10/QN/002")];
        let allocator = NumberAllocator::default();
        let a = allocator.next_number(DocumentType::Quotation, &existing, today());
        let b = allocator.next_number(DocumentType::Quotation, &existing, today());
        assert_eq!(a, b);
    }

    #[test]
    fn test_widens_past_999() {
        let existing = vec![
            issued(DocumentType::Quotation, "ORG/2026/10/QN/999"),
            issued(DocumentType::Quotation, "ORG/2026/10/QN/1000"),
        ];
        let next =
            NumberAllocator::default().next_number(DocumentType::Quotation, &existing, today());
        assert_eq!(next.to_string(), "ORG/2026/10/QN/1001");
    }

    #[test]
    fn test_ignores_unparseable_suffix() {
        let existing = vec![
            issued(DocumentType::Quotation, "ORG/2026/10/QN/draft"),
            issued(DocumentType::Quotation, "ORG/2026/10/QN/004"),
        ];
        let next =
            NumberAllocator::default().next_number(DocumentType::Quotation, &existing, today());
        assert_eq!(next.seq(), 5);
    }

    #[test]
    fn test_custom_org_prefix() {
        let allocator = NumberAllocator::new("GEO");
        let existing = vec![issued(DocumentType::DeliveryChallan, "ORG/2026/10/DC/004")];
        let next = allocator.next_number(DocumentType::DeliveryChallan, &existing, today());
        assert_eq!(next.to_string(), "GEO/2026/10/DC/001");
    }

    #[test]
    fn test_first_in_scope() {
        let fallback = NumberAllocator::default().first_in_scope(DocumentType::PurchaseOrder, today());
        assert_eq!(fallback.to_string(), "ORG/2026/10/PO/001");
    }

    #[test]
    fn test_parse_number() {
        let number: DocumentNumber = "ORG/2026/03/PI/012".parse().unwrap();
        assert_eq!(number.org(), "ORG");
        assert_eq!(number.document_type(), DocumentType::ProformaInvoice);
        assert_eq!(number.scope().year, 2026);
        assert_eq!(number.scope().month, 3);
        assert_eq!(number.seq(), 12);
        assert_eq!(number.to_string(), "ORG/2026/03/PI/012");

        let nested: DocumentNumber = "ACME/LAB/2026/03/PI/012".parse().unwrap();
        assert_eq!(nested.org(), "ACME/LAB");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_number("ORG/2026/10/QN").is_err());
        assert!(parse_number("ORG/2026/13/QN/001").is_err());
        assert!(parse_number("ORG/2026/10/XX/001").is_err());
        assert!(parse_number("ORG/2026/10/QN/-1").is_err());
        assert!(parse_number("/2026/10/QN/001").is_err());
    }
}
