//! # kasir-db: Database Layer for Kasir POS
//!
//! SQLite persistence for the point-of-sale order flow: the inventory and
//! cash ledgers and the coordinator that ties a checkout to both.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kasir POS Data Flow                              │
//! │                                                                         │
//! │  HTTP / validation layer (CheckoutRequest, acting user id)              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     kasir-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   OrderTransactionCoordinator                                   │   │
//! │  │        │                     │                                  │   │
//! │  │        ▼                     ▼                                  │   │
//! │  │   InventoryLedger     CashRegisterAccount                       │   │
//! │  │        │                     │                                  │   │
//! │  │        └──────────┬──────────┘                                  │   │
//! │  │                   ▼                                             │   │
//! │  │   Repositories (SQL)   ◄──   Database (pool, migrations)        │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL)                                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`config`] - Environment-driven runtime settings
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database errors, [`PosError`] and [`ErrorResponse`]
//! - [`repository`] - SQL per aggregate
//! - [`ledger`] - Inventory and cash ledgers
//! - [`coordinator`] - Checkout and cancellation
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kasir_db::{Database, PosConfig};
//!
//! let config = PosConfig::load()?;
//! let db = Database::new(config.db_config()).await?;
//! let pos = db.coordinator(config.ledger_policy(), config.payment_methods.clone());
//!
//! let detail = pos.create_order(&request, &user_id).await?;
//! pos.cancel_order(&detail.order.id, &user_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod coordinator;
pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod repository;

#[cfg(test)]
pub(crate) mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, PosConfig};
pub use coordinator::{CheckoutStage, OrderTransactionCoordinator};
pub use error::{DbError, DbResult, ErrorResponse, PosError, PosResult};
pub use ledger::{CashRegisterAccount, InventoryLedger, StockDiscrepancy, StockReconciliation};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::{
    CashRegisterRepository, CatalogRepository, InventoryRepository, OrderRepository,
};
