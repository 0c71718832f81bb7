//! # Domain Types
//!
//! Core domain types used throughout Kasir POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Order       │   │   Inventory     │   │  CashRegister   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  outlet_id      │   │  outlet_id (1:1)│       │
//! │  │  order_number   │   │  product_id     │   │  balance_cents  │       │
//! │  │  status         │   │  quantity       │   │  status         │       │
//! │  │  total_cents    │   └────────┬────────┘   └────────┬────────┘       │
//! │  └────────┬────────┘            │ 1:N                 │ 1:N            │
//! │           │ 1:N        ┌────────▼────────┐   ┌────────▼────────┐       │
//! │  ┌────────▼────────┐   │InventoryHistory │   │CashRegister     │       │
//! │  │   OrderItem     │   │ (append-only)   │   │Transaction      │       │
//! │  │ price snapshot  │   │ before/after    │   │ (append-only)   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every order has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - `order_number`: human-readable invoice code printed on the receipt

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer paid. A recorded label, never a processed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Physical cash; change may be handed back.
    Cash,
    /// QRIS scan-to-pay; always settles the exact total.
    Qris,
    /// Card on an external terminal.
    Card,
    /// Bank transfer.
    Transfer,
    /// Anything else the outlet records by hand.
    Other,
}

impl PaymentMethod {
    /// Every method the system knows about.
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::Cash,
        PaymentMethod::Qris,
        PaymentMethod::Card,
        PaymentMethod::Transfer,
        PaymentMethod::Other,
    ];

    /// Exact-payment methods force `total_paid = total` and `change = 0`.
    pub const fn is_exact_payment(&self) -> bool {
        matches!(self, PaymentMethod::Qris)
    }

    /// Lowercase label used in storage and JSON.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Qris => "qris",
            PaymentMethod::Card => "card",
            PaymentMethod::Transfer => "transfer",
            PaymentMethod::Other => "other",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "payment_method".to_string(),
                allowed: PaymentMethod::ALL
                    .iter()
                    .map(|m| m.as_str().to_string())
                    .collect(),
            })
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// The status of an order.
///
/// ```text
/// pending ──► completed ──► cancelled
/// ```
/// `pending` is only ever visible inside the creating transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Inventory History Type
// =============================================================================

/// Why a stock quantity changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum HistoryType {
    Purchase,
    /// Sales and, for now, their cancellations.
    Sale,
    Adjustment,
    Transfer,
    Stocktake,
}

// =============================================================================
// Cash Register
// =============================================================================

/// Direction of a cash register movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum CashTransactionType {
    Add,
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum RegisterStatus {
    #[default]
    Open,
    Closed,
}

/// One register per outlet.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CashRegister {
    pub id: String,
    pub outlet_id: String,
    /// Signed balance in minor units.
    pub balance_cents: i64,
    pub status: RegisterStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl CashRegister {
    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_cents(self.balance_cents)
    }
}

/// Append-only log entry for every register balance mutation.
///
/// The balance after the movement is deliberately not stored here; replay the
/// log or read the live register.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CashRegisterTransaction {
    pub id: String,
    pub cash_register_id: String,
    pub shift_id: String,
    pub user_id: String,
    pub transaction_type: CashTransactionType,
    /// Positive magnitude; direction comes from `transaction_type`.
    pub amount_cents: i64,
    pub reason: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl CashRegisterTransaction {
    /// Signed effect of this entry on the balance.
    pub fn signed_amount(&self) -> Money {
        match self.transaction_type {
            CashTransactionType::Add => Money::from_cents(self.amount_cents),
            CashTransactionType::Remove => -Money::from_cents(self.amount_cents),
        }
    }
}

/// Input for a credit or debit against a register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CashMovement {
    pub amount: Money,
    pub user_id: String,
    pub shift_id: String,
    pub reason: String,
}

// =============================================================================
// Inventory
// =============================================================================

/// Stock counter for one (outlet, product) pair.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Inventory {
    pub id: String,
    pub outlet_id: String,
    pub product_id: String,
    /// May be negative under the default policy.
    pub quantity: i64,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Immutable audit record of one stock mutation.
///
/// Invariant: `quantity_after == quantity_before + quantity_change`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryHistory {
    pub id: String,
    pub outlet_id: String,
    pub product_id: String,
    pub quantity_before: i64,
    pub quantity_after: i64,
    pub quantity_change: i64,
    pub history_type: HistoryType,
    pub notes: Option<String>,
    pub user_id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl InventoryHistory {
    /// Checks the before/after/change invariant on this record alone.
    pub fn is_consistent(&self) -> bool {
        self.quantity_before.checked_add(self.quantity_change) == Some(self.quantity_after)
    }
}

/// A requested stock mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockChange {
    pub outlet_id: String,
    pub product_id: String,
    /// Negative for sales, positive for cancellations and restocks.
    pub delta: i64,
    pub history_type: HistoryType,
    pub user_id: String,
    pub note: Option<String>,
}

// =============================================================================
// Ledger Policy
// =============================================================================

/// What to do when an order line has no inventory row at its outlet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockingPolicy {
    /// Skip silently: the product is simply not stocked here.
    #[default]
    Lenient,
    /// Fail the whole unit of work with a not-found error.
    Strict,
}

impl FromStr for StockingPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(StockingPolicy::Lenient),
            "strict" => Ok(StockingPolicy::Strict),
            _ => Err(ValidationError::NotAllowed {
                field: "stocking_policy".to_string(),
                allowed: vec!["lenient".to_string(), "strict".to_string()],
            }),
        }
    }
}

/// Knobs of the inventory ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerPolicy {
    pub stocking: StockingPolicy,
    /// When false, a change that would leave the quantity below zero fails.
    pub allow_negative_stock: bool,
}

impl Default for LedgerPolicy {
    fn default() -> Self {
        LedgerPolicy {
            stocking: StockingPolicy::Lenient,
            allow_negative_stock: true,
        }
    }
}

// =============================================================================
// Order
// =============================================================================

/// A sales order and its money breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub order_number: String,
    pub outlet_id: String,
    pub user_id: String,
    pub shift_id: String,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    /// `subtotal + tax - discount`, never negative.
    pub total_cents: i64,
    pub total_paid_cents: i64,
    /// `total_paid - total`; negative when a cash sale was under-collected.
    pub change_cents: i64,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn change(&self) -> Money {
        Money::from_cents(self.change_cents)
    }
}

/// A line of an order. Uses snapshot pattern to freeze the unit price.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub quantity: i64,
    /// Unit price at time of sale (frozen).
    pub price_cents: i64,
    /// `quantity × price_cents`, computed at creation.
    pub subtotal_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

/// An order together with its lines.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

// =============================================================================
// Checkout Request
// =============================================================================

/// One submitted order line. The price is trusted from the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutItem {
    pub product_id: String,
    pub quantity: i64,
    pub price_cents: i64,
}

impl CheckoutItem {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// The shape the validation layer hands to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutRequest {
    pub outlet_id: String,
    pub shift_id: String,
    pub items: Vec<CheckoutItem>,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub total_paid_cents: Option<i64>,
    #[serde(default)]
    pub tax_cents: Option<i64>,
    #[serde(default)]
    pub discount_cents: Option<i64>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_method_parsing() {
        assert_eq!("cash".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert_eq!(" QRIS ".parse::<PaymentMethod>().unwrap(), PaymentMethod::Qris);
        assert!("bitcoin".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_only_qris_is_exact_payment() {
        let exact: Vec<_> = PaymentMethod::ALL
            .into_iter()
            .filter(PaymentMethod::is_exact_payment)
            .collect();
        assert_eq!(exact, vec![PaymentMethod::Qris]);
    }

    #[test]
    fn test_order_status_default() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
        assert_eq!(OrderStatus::Cancelled.to_string(), "cancelled");
    }

    #[test]
    fn test_stocking_policy_parsing() {
        assert_eq!(
            "strict".parse::<StockingPolicy>().unwrap(),
            StockingPolicy::Strict
        );
        assert_eq!(
            "Lenient".parse::<StockingPolicy>().unwrap(),
            StockingPolicy::Lenient
        );
        assert!("loose".parse::<StockingPolicy>().is_err());
        assert_eq!(LedgerPolicy::default().stocking, StockingPolicy::Lenient);
        assert!(LedgerPolicy::default().allow_negative_stock);
    }

    #[test]
    fn test_signed_amount() {
        let mut entry = CashRegisterTransaction {
            id: "t".into(),
            cash_register_id: "r".into(),
            shift_id: "s".into(),
            user_id: "u".into(),
            transaction_type: CashTransactionType::Add,
            amount_cents: 3100,
            reason: "POS sale".into(),
            created_at: Utc::now(),
        };
        assert_eq!(entry.signed_amount().cents(), 3100);

        entry.transaction_type = CashTransactionType::Remove;
        assert_eq!(entry.signed_amount().cents(), -3100);
    }

    #[test]
    fn test_checkout_request_optional_fields_default() {
        let json = r#"{
            "outlet_id": "o1",
            "shift_id": "s1",
            "items": [{ "product_id": "p1", "quantity": 2, "price_cents": 1500 }],
            "payment_method": "qris"
        }"#;
        let request: CheckoutRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.payment_method, PaymentMethod::Qris);
        assert_eq!(request.total_paid_cents, None);
        assert_eq!(request.tax_cents, None);
        assert_eq!(request.items[0].price().cents(), 1500);
    }
}
