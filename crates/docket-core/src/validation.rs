//! # Validation Module
//!
//! Business rule checks applied before a value enters the editor or a record
//! leaves for storage.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: Web console form                                             │
//! │  └── Empty fields, numeric inputs                                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: DocumentEditor / DocumentService (Rust)                      │
//! │  └── THIS MODULE: quantities, prices, rates, client, ids               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Storage                                                      │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── UNIQUE document_number                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use docket_core::validation::{validate_quantity, validate_rate};
//! use docket_core::types::Rate;
//! use rust_decimal::Decimal;
//!
//! validate_quantity(Decimal::new(25, 1)).unwrap();
//! assert!(validate_rate("discount", Rate::from_bps(12_000)).is_err());
//! ```

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::money::Money;
use crate::pagination::PageCapacity;
use crate::types::{DocumentRecord, LineItem, Rate};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest client name accepted on a document.
pub const MAX_CLIENT_NAME_LEN: usize = 200;

/// Longest operator display name shown in notifications.
pub const MAX_DISPLAY_NAME_LEN: usize = 100;

/// 100% in basis points.
pub const MAX_RATE_BPS: u32 = 10_000;

// =============================================================================
// Line Items
// =============================================================================

/// Quantities are fractional (metres, days) but always > 0.
pub fn validate_quantity(quantity: Decimal) -> ValidationResult<()> {
    if quantity <= Decimal::ZERO {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Zero is allowed (complimentary tests).
///
/// ```rust
/// use docket_core::money::Money;
/// use docket_core::validation::validate_unit_price;
///
/// assert!(validate_unit_price(Money::zero()).is_ok());
/// assert!(validate_unit_price(Money::from_paise(-1)).is_err());
/// ```
pub fn validate_unit_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "unit price".to_string(),
        });
    }

    Ok(())
}

pub fn validate_line_item(item: &LineItem) -> ValidationResult<()> {
    validate_quantity(item.quantity)?;
    validate_unit_price(item.unit_price)?;

    if !item.has_consistent_total() {
        return Err(ValidationError::InvalidFormat {
            field: "line total".to_string(),
            reason: format!("row {} total does not match price × quantity", item.id),
        });
    }

    Ok(())
}

// =============================================================================
// Rates
// =============================================================================

/// Discount and GST rates: 0% to 100%.
pub fn validate_rate(field: &str, rate: Rate) -> ValidationResult<()> {
    if rate.bps() > MAX_RATE_BPS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_RATE_BPS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Documents
// =============================================================================

pub fn validate_client_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "client name".to_string(),
        });
    }

    if name.chars().count() > MAX_CLIENT_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "client name".to_string(),
            max: MAX_CLIENT_NAME_LEN,
        });
    }

    Ok(())
}

/// Operator display name. Blank is allowed (the email is shown instead).
pub fn validate_display_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.chars().count() > MAX_DISPLAY_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "display name".to_string(),
            max: MAX_DISPLAY_NAME_LEN,
        });
    }

    if name.chars().any(char::is_control) {
        return Err(ValidationError::InvalidFormat {
            field: "display name".to_string(),
            reason: "must not contain control characters".to_string(),
        });
    }

    Ok(())
}

/// Everything a record must satisfy before it is persisted.
///
/// ## Rules
/// - id present (older stores used non-UUID ids, which stay valid)
/// - client name present
/// - discount within 0..=100%
/// - every line item valid
pub fn validate_for_save(record: &DocumentRecord) -> ValidationResult<()> {
    validate_record_id(&record.id)?;
    validate_client_name(&record.client_name)?;
    validate_rate("discount", record.content.discount)?;
    for item in &record.content.items {
        validate_line_item(item)?;
    }

    if let Some(payment) = record.content.quote_details.payment_amount {
        if payment.is_negative() {
            return Err(ValidationError::MustNotBeNegative {
                field: "payment amount".to_string(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Configuration
// =============================================================================

/// Builds a capacity pair from raw configuration values.
pub fn validate_capacity(
    stream: &str,
    first: usize,
    continuation: usize,
) -> ValidationResult<PageCapacity> {
    PageCapacity::new(first, continuation).ok_or_else(|| ValidationError::MustBePositive {
        field: format!("{} page capacity", stream),
    })
}

// =============================================================================
// Record Ids
// =============================================================================

/// Longest record id accepted by the stores.
pub const MAX_RECORD_ID_LEN: usize = 128;

/// Any non-blank key without surrounding whitespace.
///
/// New documents get a UUID from the editor, but records written by older
/// consoles carry ids like `legacy-1` or a bare number and must stay
/// saveable.
///
/// ## Example
/// ```rust
/// use docket_core::validation::validate_record_id;
///
/// assert!(validate_record_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_record_id("legacy-1").is_ok());
/// assert!(validate_record_id("  ").is_err());
/// ```
pub fn validate_record_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    if id.trim() != id || id.chars().any(char::is_control) {
        return Err(ValidationError::InvalidFormat {
            field: "id".to_string(),
            reason: "must not contain surrounding whitespace or control characters".to_string(),
        });
    }

    if id.chars().count() > MAX_RECORD_ID_LEN {
        return Err(ValidationError::TooLong {
            field: "id".to_string(),
            max: MAX_RECORD_ID_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DocumentContent, DocumentType, ACCOUNT_RECORD_TYPE};

    fn record() -> DocumentRecord {
        DocumentRecord {
            id: "550e8400-e29b-41d4-a716-446655440000".to_string(),
            record_type: ACCOUNT_RECORD_TYPE.to_string(),
            document_type: DocumentType::Quotation,
            document_number: None,
            client_name: "Acme Infra".to_string(),
            content: DocumentContent::default(),
            created_by: "ops@example.com".to_string(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(Decimal::ONE).is_ok());
        assert!(validate_quantity(Decimal::new(5, 1)).is_ok());
        assert!(validate_quantity(Decimal::ZERO).is_err());
        assert!(validate_quantity(Decimal::NEGATIVE_ONE).is_err());
    }

    #[test]
    fn test_validate_rate() {
        assert!(validate_rate("cgst", Rate::zero()).is_ok());
        assert!(validate_rate("cgst", Rate::from_bps(10_000)).is_ok());
        assert!(validate_rate("cgst", Rate::from_bps(10_001)).is_err());
    }

    #[test]
    fn test_validate_client_name() {
        assert!(validate_client_name("Acme").is_ok());
        assert!(validate_client_name("   ").is_err());
        assert!(validate_client_name(&"A".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_for_save() {
        assert!(validate_for_save(&record()).is_ok());

        let mut missing_client = record();
        missing_client.client_name = String::new();
        assert!(matches!(
            validate_for_save(&missing_client),
            Err(ValidationError::Required { .. })
        ));

        let mut legacy_id = record();
        legacy_id.id = "123".to_string();
        assert!(validate_for_save(&legacy_id).is_ok());

        let mut blank_id = record();
        blank_id.id = " ".to_string();
        assert!(matches!(
            validate_for_save(&blank_id),
            Err(ValidationError::Required { .. })
        ));

        let mut negative_payment = record();
        negative_payment.content.quote_details.payment_amount = Some(Money::from_rupees(-5));
        assert!(validate_for_save(&negative_payment).is_err());
    }

    #[test]
    fn test_validate_capacity() {
        assert!(validate_capacity("items", 8, 14).is_ok());
        let err = validate_capacity("items", 0, 14).unwrap_err();
        assert_eq!(err.to_string(), "items page capacity must be positive");
    }

    #[test]
    fn test_validate_record_id() {
        assert!(validate_record_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_record_id("legacy-1").is_ok());
        assert!(validate_record_id("1700000000000").is_ok());
        assert!(validate_record_id("").is_err());
        assert!(validate_record_id(" legacy-1").is_err());
        assert!(validate_record_id(&"x".repeat(129)).is_err());
    }

    #[test]
    fn test_validate_display_name() {
        assert!(validate_display_name("Site Lead").is_ok());
        assert!(validate_display_name("").is_ok());
        assert!(validate_display_name(&"n".repeat(101)).is_err());
        assert!(validate_display_name("tab\there").is_err());
    }
}
