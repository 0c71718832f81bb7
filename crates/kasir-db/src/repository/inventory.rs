//! # Inventory Repository
//!
//! Stock rows per (outlet, product) and their append-only history.
//!
//! Quantities only move through [`crate::ledger::InventoryLedger`]; this module
//! holds the SQL it runs.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use kasir_core::{Inventory, InventoryHistory};

const HISTORY_COLUMNS: &str = r#"
    id, outlet_id, product_id, quantity_before, quantity_after, quantity_change,
    type AS history_type, notes, user_id, created_at
"#;

/// Repository for stock reads and stock-row provisioning.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Current quantity, or `None` if the product is not stocked at the outlet.
    pub async fn quantity(&self, outlet_id: &str, product_id: &str) -> DbResult<Option<i64>> {
        let mut conn = self.pool.acquire().await?;
        current_quantity(&mut conn, outlet_id, product_id).await
    }

    /// History of one (outlet, product) pair, oldest first.
    pub async fn history(
        &self,
        outlet_id: &str,
        product_id: &str,
    ) -> DbResult<Vec<InventoryHistory>> {
        let sql = format!(
            "SELECT {} FROM inventory_histories \
             WHERE outlet_id = ?1 AND product_id = ?2 \
             ORDER BY rowid",
            HISTORY_COLUMNS
        );
        let history = sqlx::query_as::<_, InventoryHistory>(&sql)
            .bind(outlet_id)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(history)
    }

    /// Creates the stock row for a product at an outlet.
    ///
    /// Provisioning only: the starting quantity is not a movement and writes
    /// no history. Later changes go through the ledger.
    pub async fn create(
        &self,
        outlet_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> DbResult<Inventory> {
        let inventory = Inventory {
            id: Uuid::new_v4().to_string(),
            outlet_id: outlet_id.to_string(),
            product_id: product_id.to_string(),
            quantity,
            updated_at: Utc::now(),
        };

        debug!(outlet_id, product_id, quantity, "Creating inventory row");

        sqlx::query(
            r#"
            INSERT INTO inventories (id, outlet_id, product_id, quantity, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&inventory.id)
        .bind(&inventory.outlet_id)
        .bind(&inventory.product_id)
        .bind(inventory.quantity)
        .bind(inventory.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(inventory)
    }
}

// =============================================================================
// Transaction-scoped statements
// =============================================================================

pub(crate) async fn current_quantity(
    conn: &mut SqliteConnection,
    outlet_id: &str,
    product_id: &str,
) -> DbResult<Option<i64>> {
    let quantity: Option<i64> = sqlx::query_scalar(
        "SELECT quantity FROM inventories WHERE outlet_id = ?1 AND product_id = ?2",
    )
    .bind(outlet_id)
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(quantity)
}

/// Applies `delta` to the stock row and returns the new quantity.
///
/// Returns `None` when no row matched: either the pair is not stocked, or
/// `allow_negative` is false and a decrement would go below zero. Increments
/// are never refused.
pub(crate) async fn apply_delta(
    conn: &mut SqliteConnection,
    outlet_id: &str,
    product_id: &str,
    delta: i64,
    allow_negative: bool,
    now: DateTime<Utc>,
) -> DbResult<Option<i64>> {
    let after: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE inventories
        SET quantity = quantity + ?3, updated_at = ?5
        WHERE outlet_id = ?1 AND product_id = ?2
          AND (?4 OR ?3 >= 0 OR quantity + ?3 >= 0)
        RETURNING quantity
        "#,
    )
    .bind(outlet_id)
    .bind(product_id)
    .bind(delta)
    .bind(allow_negative)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(after)
}

pub(crate) async fn insert_history(
    conn: &mut SqliteConnection,
    history: &InventoryHistory,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO inventory_histories (
            id, outlet_id, product_id,
            quantity_before, quantity_after, quantity_change,
            type, notes, user_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&history.id)
    .bind(&history.outlet_id)
    .bind(&history.product_id)
    .bind(history.quantity_before)
    .bind(history.quantity_after)
    .bind(history.quantity_change)
    .bind(history.history_type)
    .bind(&history.notes)
    .bind(&history.user_id)
    .bind(history.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
