//! # Repository Module
//!
//! SQL for Kasir POS, one module per aggregate.
//!
//! ## Two Kinds of Access
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Pool-based repositories (pub)        Connection-scoped statements      │
//! │  ─────────────────────────────        ─────────────────────────────     │
//! │  db.orders().get_by_id(id)            order::insert_order(&mut *tx, ..) │
//! │  db.inventory().history(o, p)         inventory::apply_delta(..)        │
//! │  db.cash_registers().open(o, m)       cash_register::insert_transaction │
//! │                                                                         │
//! │  Reads and provisioning,              pub(crate): only the ledgers and  │
//! │  each call on its own connection      the coordinator run them, always  │
//! │                                       on the caller's transaction       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`OrderRepository`] - Orders and order items
//! - [`InventoryRepository`] - Stock rows and stock history
//! - [`CashRegisterRepository`] - Registers and their transaction log
//! - [`CatalogRepository`] - Outlets, operators, products, shifts

pub mod cash_register;
pub mod catalog;
pub mod inventory;
pub mod order;

pub use cash_register::CashRegisterRepository;
pub use catalog::CatalogRepository;
pub use inventory::InventoryRepository;
pub use order::OrderRepository;
