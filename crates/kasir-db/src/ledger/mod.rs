//! # Ledgers
//!
//! The only code allowed to move stock quantities and register balances.
//! Each movement is one conditional update plus one append-only audit row,
//! executed on whatever transaction the caller hands in.
//!
//! - [`InventoryLedger`] - stock per (outlet, product)
//! - [`CashRegisterAccount`] - cash per outlet

pub mod cash_register;
pub mod inventory;

pub use cash_register::CashRegisterAccount;
pub use inventory::{InventoryLedger, StockDiscrepancy, StockReconciliation};
