//! # docket-core: Pure Document Logic for Docket
//!
//! This crate holds everything about a quotation or invoice that can be
//! computed without touching storage or the network.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Docket Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 console (apps/console)                          │   │
//! │  │    CLI ──► DocumentService ──► Notifier                         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ docket-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │ numbering │  │pagination │  │  totals   │  │  editor   │  │   │
//! │  │   │ ORG/../QN │  │  Page<T>  │  │ GST words │  │  dirty    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               docket-db (Persistence Gateway)                   │   │
//! │  │          Postgres, Redis and in-memory document stores          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (LineItem, DocumentRecord, DocumentType, ...)
//! - [`money`] - Decimal rupee amounts
//! - [`numbering`] - `ORG/YYYY/MM/TC/SEQ` allocation
//! - [`pagination`] - Item, term and technical page streams
//! - [`totals`] - Discount and GST totals
//! - [`words`] - Amount in words (Indian numbering)
//! - [`editor`] - In-progress document, dirty tracking, save lifecycle
//! - [`layout`] - Printed page sequence and footers
//! - [`validation`] - Business rule validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use docket_core::numbering::NumberAllocator;
//! use docket_core::types::DocumentType;
//!
//! let allocator = NumberAllocator::new("ORG");
//! let today = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
//! let number = allocator.next_number(DocumentType::Quotation, &[], today);
//! assert_eq!(number.to_string(), "ORG/2026/10/QN/001");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod editor;
pub mod error;
pub mod layout;
pub mod money;
pub mod numbering;
pub mod pagination;
pub mod totals;
pub mod types;
pub mod validation;
pub mod words;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use editor::{DocumentEditor, NavigationGuard, SavePlan};
pub use error::{CoreError, CoreResult, ValidationError};
pub use layout::DocumentLayout;
pub use money::Money;
pub use numbering::{DocumentNumber, NumberAllocator};
pub use pagination::{GroupEntry, Page, PageCapacity, PaginationConfig};
pub use totals::{compute_totals, TaxConfig, Totals};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Organisation segment of document numbers when none is configured.
pub const DEFAULT_ORG_PREFIX: &str = "ORG";

/// Clause group printed without a header.
pub const GENERAL_GROUP: &str = "General";

/// CGST when the tax configuration leaves it unset (9%).
pub const DEFAULT_CGST_BPS: u32 = 900;

/// SGST when the tax configuration leaves it unset (9%).
pub const DEFAULT_SGST_BPS: u32 = 900;
