//! # kasir-core: Pure Business Logic for Kasir POS
//!
//! This crate holds everything about an order that can be decided without
//! touching the database: money arithmetic, checkout pricing, payment-method
//! rules, input validation and the error taxonomy.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kasir POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            HTTP / auth / catalog (outside this workspace)       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ CheckoutRequest + acting user          │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kasir-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  pricing  │  │ validation│  │   │
//! │  │   │   Order   │  │   Money   │  │  totals   │  │   rules   │  │   │
//! │  │   │ Inventory │  │           │  │  change   │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    kasir-db (Database Layer)                    │   │
//! │  │      SQLite, inventory/cash ledgers, order coordinator          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Order, Inventory, CashRegister, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - Server-side order totals and change
//! - [`error`] - Domain error types and the error taxonomy
//! - [`validation`] - Checkout request validation
//!
//! ## Example Usage
//!
//! ```rust
//! use kasir_core::money::Money;
//! use kasir_core::pricing::compute_totals;
//! use kasir_core::types::{CheckoutItem, PaymentMethod};
//!
//! let items = vec![CheckoutItem {
//!     product_id: "kopi".to_string(),
//!     quantity: 2,
//!     price_cents: 1500,
//! }];
//!
//! let totals = compute_totals(
//!     &items,
//!     Money::from_cents(100),
//!     Money::zero(),
//!     PaymentMethod::Cash,
//!     Some(Money::from_cents(5000)),
//! )
//! .unwrap();
//!
//! assert_eq!(totals.total.cents(), 3100);
//! assert_eq!(totals.change.cents(), 1900);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of lines allowed in a single order.
pub const MAX_ORDER_LINES: usize = 100;

/// Maximum quantity on a single order line.
///
/// Keeps `quantity × price` well inside `i64` for any sane price.
pub const MAX_ITEM_QUANTITY: i64 = 100_000;

/// Prefix of every generated invoice number.
pub const ORDER_NUMBER_PREFIX: &str = "INV";
