//! # Database Error Types
//!
//! Error types for database operations, plus the unified [`PosError`] every
//! unit of work returns.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)          Domain rule broken                 │
//! │       │                                   │                             │
//! │       ▼                                   ▼                             │
//! │  DbError (categorised)               CoreError (kasir-core)             │
//! │       │                                   │                             │
//! │       └──────────────┬────────────────────┘                             │
//! │                      ▼                                                  │
//! │               PosError::kind() ← five-way taxonomy                      │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │               ErrorResponse { code, message } ← sent to the client      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;

use kasir_core::{CoreError, ErrorKind, ValidationError};

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and user feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Two orders generated the same order number
    /// - A second register for the same outlet
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Checkout names an outlet, shift, user or product that does not exist
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    ///
    /// CHECK constraints and the append-only triggers land here.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Classifies the storage error into the client-facing taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DbError::NotFound { .. } => ErrorKind::NotFound,
            DbError::UniqueViolation { .. } | DbError::ForeignKeyViolation { .. } => {
                ErrorKind::ValidationError
            }
            _ => ErrorKind::Unexpected,
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite constraint messages:
                // UNIQUE constraint: "UNIQUE constraint failed: <table>.<column>"
                // FK constraint: "FOREIGN KEY constraint failed"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Unified Error
// =============================================================================

/// Error returned by the ledgers and the order coordinator.
#[derive(Debug, Error)]
pub enum PosError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl PosError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PosError::Core(err) => err.kind(),
            PosError::Db(err) => err.kind(),
        }
    }
}

impl From<sqlx::Error> for PosError {
    fn from(err: sqlx::Error) -> Self {
        PosError::Db(err.into())
    }
}

impl From<ValidationError> for PosError {
    fn from(err: ValidationError) -> Self {
        PosError::Core(err.into())
    }
}

pub type PosResult<T> = Result<T, PosError>;

// =============================================================================
// Error Response
// =============================================================================

/// What a caller receives when an operation fails.
///
/// ## Serialization
/// ```json
/// {
///   "code": "INSUFFICIENT_FUNDS",
///   "message": "Insufficient cash in register: available 2000 cents, requested 3100 cents"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorKind,

    /// Human-readable error message for display
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: ErrorKind, message: impl Into<String>) -> Self {
        ErrorResponse {
            code,
            message: message.into(),
        }
    }
}

impl From<&PosError> for ErrorResponse {
    fn from(err: &PosError) -> Self {
        match err {
            PosError::Core(core) => ErrorResponse::new(core.kind(), core.to_string()),
            PosError::Db(DbError::NotFound { entity, id }) => {
                ErrorResponse::new(ErrorKind::NotFound, format!("{} not found: {}", entity, id))
            }
            PosError::Db(DbError::UniqueViolation { field, .. }) => ErrorResponse::new(
                ErrorKind::ValidationError,
                format!("{} already exists", field),
            ),
            PosError::Db(DbError::ForeignKeyViolation { message }) => {
                tracing::error!("Foreign key violation: {}", message);
                ErrorResponse::new(ErrorKind::ValidationError, "Invalid reference")
            }
            PosError::Db(db) => {
                // Log the actual error but return a generic message
                tracing::error!(error = %db, "Unexpected storage failure");
                ErrorResponse::new(ErrorKind::Unexpected, "An unexpected error occurred")
            }
        }
    }
}

impl From<PosError> for ErrorResponse {
    fn from(err: PosError) -> Self {
        ErrorResponse::from(&err)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let err: PosError = CoreError::InsufficientFunds {
            available: 2000,
            requested: 3100,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);

        let err: PosError = DbError::ForeignKeyViolation {
            message: "FOREIGN KEY constraint failed".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::ValidationError);

        let err: PosError = DbError::QueryFailed("CHECK constraint failed".into()).into();
        assert_eq!(err.kind(), ErrorKind::Unexpected);

        let err: PosError = ValidationError::Required {
            field: "items".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
    }

    #[test]
    fn test_unexpected_message_is_generic() {
        let err = PosError::Db(DbError::Internal("disk I/O error at page 17".into()));
        let response = ErrorResponse::from(&err);

        assert_eq!(response.code, ErrorKind::Unexpected);
        assert!(!response.message.contains("page 17"));
    }

    #[test]
    fn test_response_serialization() {
        let err: PosError = CoreError::CashRegisterMissing {
            outlet_id: "outlet-1".into(),
        }
        .into();
        let json = serde_json::to_value(ErrorResponse::from(err)).unwrap();

        assert_eq!(json["code"], "PRECONDITION_FAILED");
        assert_eq!(
            json["message"],
            "No cash register configured for outlet outlet-1"
        );
    }
}
