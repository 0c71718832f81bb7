//! # Validation Module
//!
//! Input validation for checkout requests and cash movements.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP validation layer (outside this workspace)               │
//! │  ├── Request shape, field presence                                     │
//! │  └── Immediate 422 responses                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  ├── Quantities, prices, amounts                                       │
//! │  └── Payment method allowed for the checkout                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints (amounts, history invariant)                    │
//! │  ├── UNIQUE constraints (order number, inventory pair)                 │
//! │  └── Foreign key constraints (outlet, shift, product, user exist)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{CheckoutRequest, PaymentMethod};
use crate::{MAX_ITEM_QUANTITY, MAX_ORDER_LINES};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates that a reference id is present.
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY
///
/// ## Example
/// ```rust
/// use kasir_core::validation::validate_quantity;
///
/// assert!(validate_quantity(1).is_ok());
/// assert!(validate_quantity(0).is_err());
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a ledger stock change.
///
/// ## Rules
/// - Must not be zero; a no-op movement would still append history
/// - Magnitude must fit an `i64` so it can be reported back
pub fn validate_stock_delta(delta: i64) -> ValidationResult<()> {
    if delta == 0 {
        return Err(ValidationError::InvalidFormat {
            field: "delta".to_string(),
            reason: "must not be zero".to_string(),
        });
    }

    if delta.checked_abs().is_none() {
        return Err(ValidationError::Overflow {
            field: "delta".to_string(),
        });
    }

    Ok(())
}

/// Validates a unit price. Zero is allowed (free items).
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    validate_non_negative("price", cents)
}

/// Validates an optional amount such as tax, discount or total paid.
pub fn validate_non_negative(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a cash register movement amount.
///
/// ## Rules
/// - Must be positive (> 0); a zero movement is a caller bug
pub fn validate_cash_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }
    Ok(())
}

/// Validates that the payment method is accepted by this checkout.
pub fn validate_payment_method(
    method: PaymentMethod,
    allowed: &[PaymentMethod],
) -> ValidationResult<()> {
    if !allowed.contains(&method) {
        return Err(ValidationError::NotAllowed {
            field: "payment_method".to_string(),
            allowed: allowed.iter().map(|m| m.as_str().to_string()).collect(),
        });
    }
    Ok(())
}

// =============================================================================
// Request Validators
// =============================================================================

/// Validates a whole checkout request before any I/O happens.
///
/// ## Example
/// ```rust
/// use kasir_core::types::{CheckoutItem, CheckoutRequest, PaymentMethod};
/// use kasir_core::validation::validate_checkout;
///
/// let request = CheckoutRequest {
///     outlet_id: "outlet-1".into(),
///     shift_id: "shift-1".into(),
///     items: vec![CheckoutItem { product_id: "p1".into(), quantity: 2, price_cents: 1500 }],
///     payment_method: PaymentMethod::Cash,
///     notes: None,
///     total_paid_cents: Some(5000),
///     tax_cents: None,
///     discount_cents: None,
/// };
/// assert!(validate_checkout(&request, &[PaymentMethod::Cash, PaymentMethod::Qris]).is_ok());
/// ```
pub fn validate_checkout(
    request: &CheckoutRequest,
    allowed_methods: &[PaymentMethod],
) -> ValidationResult<()> {
    validate_id("outlet_id", &request.outlet_id)?;
    validate_id("shift_id", &request.shift_id)?;

    if request.items.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if request.items.len() > MAX_ORDER_LINES {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_ORDER_LINES as i64,
        });
    }

    for item in &request.items {
        validate_id("items.product_id", &item.product_id)?;
        validate_quantity(item.quantity)?;
        validate_price_cents(item.price_cents)?;
    }

    validate_payment_method(request.payment_method, allowed_methods)?;

    if let Some(paid) = request.total_paid_cents {
        validate_non_negative("total_paid", paid)?;
    }
    if let Some(tax) = request.tax_cents {
        validate_non_negative("tax", tax)?;
    }
    if let Some(discount) = request.discount_cents {
        validate_non_negative("discount", discount)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
