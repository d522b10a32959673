//! # Console Error Types
//!
//! What the operator sees when a command or a save fails.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DocumentService::save                                                 │
//! │       │                                                                 │
//! │       ├── ValidationError ────────► SaveError::Validation              │
//! │       ├── CoreError (save state) ─► SaveError::Editor                  │
//! │       ├── DbError::UniqueViolation ─ retry ─► SaveError::DuplicateNumber│
//! │       └── DbError (other) ────────► SaveError::Storage                 │
//! │                                          │                              │
//! │                                          ▼                              │
//! │  CLI command ──────────────────────► ApiError { code, message }        │
//! │                                                                         │
//! │  $ docket show 42                                                       │
//! │  error [NOT_FOUND]: Document not found: 42                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;

use docket_core::{CoreError, ValidationError};
use docket_db::DbError;

use crate::config::ConfigError;

// =============================================================================
// Save Error
// =============================================================================

/// Failure of [`DocumentService::save`](crate::service::DocumentService::save).
/// The editor is left dirty and not saving.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("Document is not ready to save: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Editor(#[from] CoreError),

    /// Every allocated number was already taken. The operator should retry.
    #[error("Document number {number} is already taken after {attempts} attempts; please save again")]
    DuplicateNumber { number: String, attempts: u32 },

    #[error("Failed to store document: {0}")]
    Storage(#[from] DbError),
}

// =============================================================================
// API Error
// =============================================================================

/// Error returned from console commands.
///
/// ```json
/// { "code": "DUPLICATE_NUMBER", "message": "Document number ... is already taken" }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    DatabaseError,
    /// The number minted for a save collided; saving again is safe.
    DuplicateNumber,
    BusinessLogic,
    ConfigError,
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::DuplicateNumber => "DUPLICATE_NUMBER",
            ErrorCode::BusinessLogic => "BUSINESS_LOGIC",
            ErrorCode::ConfigError => "CONFIG_ERROR",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::DuplicateNumber,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ConnectionFailed(e) => {
                tracing::error!("Storage connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Storage connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) | DbError::Redis(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Storage operation failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Storage operation failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::InvalidRecord { id, reason } => ApiError::new(
                ErrorCode::DatabaseError,
                format!("Stored document {} is unreadable: {}", id, reason),
            ),
            DbError::Serialization(e) | DbError::Internal(e) => {
                tracing::error!("Internal storage error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Storage operation failed")
            }
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ItemNotFound(id) => ApiError::not_found("Line item", &id.to_string()),
            CoreError::UnknownDocumentType(value) => {
                ApiError::validation(format!("Unknown document type: {}", value))
            }
            CoreError::MalformedNumber { .. } => ApiError::validation(err.to_string()),
            CoreError::SaveInProgress(_) | CoreError::NoSaveInProgress(_) => {
                ApiError::new(ErrorCode::BusinessLogic, err.to_string())
            }
            CoreError::Snapshot(e) => ApiError::internal(e),
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<SaveError> for ApiError {
    fn from(err: SaveError) -> Self {
        match err {
            SaveError::Validation(e) => e.into(),
            SaveError::Editor(e) => e.into(),
            SaveError::DuplicateNumber { .. } => {
                ApiError::new(ErrorCode::DuplicateNumber, err.to_string())
            }
            SaveError::Storage(e) => e.into(),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::new(ErrorCode::ConfigError, err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for ApiError {}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_number_maps_to_retryable_code() {
        let err: ApiError = SaveError::DuplicateNumber {
            number: "ORG/2026/10/QN/004".to_string(),
            attempts: 4,
        }
        .into();
        assert_eq!(err.code, ErrorCode::DuplicateNumber);
        assert!(err.message.contains("ORG/2026/10/QN/004"));
    }

    #[test]
    fn test_query_failure_hides_details() {
        let err: ApiError = DbError::QueryFailed("relation \"documents\" does not exist".into()).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("relation"));
    }

    #[test]
    fn test_validation_passthrough() {
        let err: ApiError = SaveError::Validation(ValidationError::Required {
            field: "client_name".to_string(),
        })
        .into();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.to_string(), "[VALIDATION_ERROR] client_name is required");
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(ApiError::not_found("Document", "42")).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Document not found: 42");
    }
}
