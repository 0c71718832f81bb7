//! # Error Types
//!
//! Domain-specific error types for kasir-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kasir-core errors (this file)                                         │
//! │  ├── CoreError        - Domain rule failures                           │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── ErrorKind        - The taxonomy clients see                       │
//! │                                                                         │
//! │  kasir-db errors (separate crate)                                      │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── PosError         - CoreError | DbError, carries an ErrorKind      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → PosError → ErrorResponse          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

// =============================================================================
// Error Kind
// =============================================================================

/// The five error categories a caller can branch on.
///
/// Serialized as `VALIDATION_ERROR`, `NOT_FOUND`, ... so an HTTP layer can
/// forward it verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Malformed or out-of-range input.
    ValidationError,
    /// Referenced order, register or inventory row does not exist.
    NotFound,
    /// A cash debit exceeds the register balance.
    InsufficientFunds,
    /// The system is not in a state that allows the operation.
    PreconditionFailed,
    /// Anything else (storage unavailable, constraint surprises, ...).
    Unexpected,
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Every variant raised inside a unit of work causes the whole unit to roll
/// back before it reaches the caller.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Order cannot be found.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// No inventory row exists for the pair and the strict stocking policy
    /// forbids skipping it.
    #[error("No inventory for product {product_id} at outlet {outlet_id}")]
    InventoryNotFound {
        outlet_id: String,
        product_id: String,
    },

    /// Stock would go below zero while negative stock is disallowed.
    #[error("Insufficient stock for {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// The register balance cannot cover a debit.
    ///
    /// ## When This Occurs
    /// ```text
    /// Cancel order (total 31.00)
    ///      │
    ///      ▼
    /// Register balance: 20.00
    ///      │
    ///      ▼
    /// InsufficientFunds { available: 2000, requested: 3100 }
    ///      │
    ///      ▼
    /// Whole cancellation rolled back, stock untouched
    /// ```
    #[error("Insufficient cash in register: available {available} cents, requested {requested} cents")]
    InsufficientFunds { available: i64, requested: i64 },

    /// The outlet has no cash register configured.
    #[error("No cash register configured for outlet {outlet_id}")]
    CashRegisterMissing { outlet_id: String },

    /// Order is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Cancelling an order that is already cancelled
    /// - Cancelling an order that never completed
    #[error("Order {order_id} is {current_status}, cannot perform operation")]
    InvalidOrderStatus {
        order_id: String,
        current_status: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Classifies the error into the client-facing taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::OrderNotFound(_) | CoreError::InventoryNotFound { .. } => {
                ErrorKind::NotFound
            }
            CoreError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            CoreError::InsufficientStock { .. }
            | CoreError::CashRegisterMissing { .. }
            | CoreError::InvalidOrderStatus { .. } => ErrorKind::PreconditionFailed,
            CoreError::Validation(_) => ErrorKind::ValidationError,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Each variant names the offending field so the HTTP layer can attach the
/// message to the right form input.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Arithmetic on the submitted amounts left the representable range.
    #[error("{field} is too large")]
    Overflow { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientFunds {
            available: 2000,
            requested: 3100,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient cash in register: available 2000 cents, requested 3100 cents"
        );

        let err = CoreError::CashRegisterMissing {
            outlet_id: "outlet-1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "No cash register configured for outlet outlet-1"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "items".to_string(),
        };
        assert_eq!(err.to_string(), "items is required");

        let err = ValidationError::MustNotBeNegative {
            field: "discount".to_string(),
        };
        assert_eq!(err.to_string(), "discount must not be negative");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "outlet_id".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.kind(), ErrorKind::ValidationError);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            CoreError::OrderNotFound("x".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            CoreError::InsufficientFunds {
                available: 0,
                requested: 1
            }
            .kind(),
            ErrorKind::InsufficientFunds
        );
        assert_eq!(
            CoreError::CashRegisterMissing {
                outlet_id: "o".into()
            }
            .kind(),
            ErrorKind::PreconditionFailed
        );
        assert_eq!(
            CoreError::InvalidOrderStatus {
                order_id: "o".into(),
                current_status: "cancelled".into()
            }
            .kind(),
            ErrorKind::PreconditionFailed
        );
    }

    #[test]
    fn test_error_kind_serialization() {
        let json = serde_json::to_string(&ErrorKind::InsufficientFunds).unwrap();
        assert_eq!(json, "\"INSUFFICIENT_FUNDS\"");
    }
}
