//! # Error Types
//!
//! Domain-specific error types for docket-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  docket-core errors (this file)                                        │
//! │  ├── CoreError        - Editor / numbering / layout failures           │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  docket-db errors (separate crate)                                     │
//! │  └── DbError          - Storage failures                               │
//! │                                                                         │
//! │  console errors (app)                                                  │
//! │  └── SaveError / ApiError - What the operator sees                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pagination, totals and number-to-words never fail over their legal input
//! domain, so none of them appear here.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core document logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A line item row id is not part of the document.
    #[error("Line item not found: {0}")]
    ItemNotFound(u64),

    /// A document number string does not follow `ORG/YYYY/MM/TC/SEQ`.
    #[error("Malformed document number '{value}': {reason}")]
    MalformedNumber { value: String, reason: String },

    /// Unknown document type code or label.
    #[error("Unknown document type: {0}")]
    UnknownDocumentType(String),

    /// A save was requested while another one is still in flight.
    ///
    /// ## When This Occurs
    /// The editor disables the save button while `is_saving` is set; a
    /// second request reaching the core means the guard was bypassed.
    #[error("Document {0} is already being saved")]
    SaveInProgress(String),

    /// `complete_save`/`abort_save` called without a matching `begin_save`.
    #[error("Document {0} has no save in progress")]
    NoSaveInProgress(String),

    /// The editor state could not be serialized for dirty tracking.
    #[error("Snapshot failed: {0}")]
    Snapshot(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::MalformedNumber {
            value: "ORG/2026".to_string(),
            reason: "expected 5 segments".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed document number 'ORG/2026': expected 5 segments"
        );
        assert_eq!(CoreError::ItemNotFound(7).to_string(), "Line item not found: 7");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "client name".to_string(),
        };
        assert_eq!(validation_err.to_string(), "client name is required");
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
