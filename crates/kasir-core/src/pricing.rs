//! # Pricing
//!
//! Server-side order totals. Whatever the client computed is ignored: the
//! subtotal is rebuilt from the submitted lines every time.
//!
//! ```text
//! subtotal   = Σ quantity_i × price_i
//! total      = subtotal + tax − discount          (must be ≥ 0)
//!
//! exact-payment (QRIS):   total_paid = total, change = 0
//! open payment (cash…):   total_paid = given ?? total
//!                         change     = total_paid − total   (may be < 0)
//! ```

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{CheckoutItem, PaymentMethod};

/// Money breakdown of one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub discount: Money,
    pub total: Money,
    pub total_paid: Money,
    pub change: Money,
}

/// Computes `quantity × price` for one line.
pub fn line_subtotal(item: &CheckoutItem) -> CoreResult<Money> {
    item.price()
        .checked_multiply_quantity(item.quantity)
        .ok_or_else(|| overflow("items.subtotal"))
}

/// Computes the subtotal over all lines.
pub fn subtotal(items: &[CheckoutItem]) -> CoreResult<Money> {
    items.iter().try_fold(Money::zero(), |acc, item| {
        acc.checked_add(line_subtotal(item)?)
            .ok_or_else(|| overflow("subtotal"))
    })
}

/// Computes the full breakdown for a checkout.
///
/// `total_paid` is the caller's tendered amount, if any. An underpaying cash
/// sale is recorded with negative change rather than rejected.
pub fn compute_totals(
    items: &[CheckoutItem],
    tax: Money,
    discount: Money,
    method: PaymentMethod,
    total_paid: Option<Money>,
) -> CoreResult<OrderTotals> {
    let subtotal = subtotal(items)?;

    let total = subtotal
        .checked_add(tax)
        .and_then(|m| m.checked_sub(discount))
        .ok_or_else(|| overflow("total"))?;

    if total.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: subtotal.cents().saturating_add(tax.cents()),
        }
        .into());
    }

    let (total_paid, change) = if method.is_exact_payment() {
        (total, Money::zero())
    } else {
        let paid = total_paid.unwrap_or(total);
        let change = paid.checked_sub(total).ok_or_else(|| overflow("change"))?;
        (paid, change)
    };

    Ok(OrderTotals {
        subtotal,
        tax,
        discount,
        total,
        total_paid,
        change,
    })
}

fn overflow(field: &str) -> crate::error::CoreError {
    ValidationError::Overflow {
        field: field.to_string(),
    }
    .into()
}

// =============================================================================
// Unit Tests
// =============================================================================
