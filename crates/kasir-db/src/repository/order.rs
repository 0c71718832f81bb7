//! # Order Repository
//!
//! Reads for orders and their items, plus the connection-scoped writes the
//! coordinator strings together inside one transaction.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  insert_order()          → Order { status: Pending }                    │
//! │  insert_item() × N       → OrderItem (immutable snapshot)               │
//! │  mark_completed()        → Order { status: Completed }                  │
//! │       ... commit ...                                                    │
//! │  claim_cancellation()    → Order { status: Cancelled }                  │
//! │                                                                         │
//! │  All of the above run on the caller's transaction.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use kasir_core::{Order, OrderItem, OrderStatus};

const ORDER_COLUMNS: &str = r#"
    id, order_number, outlet_id, user_id, shift_id,
    subtotal_cents, tax_cents, discount_cents, total_cents,
    total_paid_cents, change_cents, payment_method, status, notes,
    created_at, updated_at
"#;

/// Repository for order reads.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        find_order(&mut conn, id).await
    }

    /// Gets an order by its invoice number.
    pub async fn get_by_number(&self, order_number: &str) -> DbResult<Option<Order>> {
        let sql = format!("SELECT {} FROM orders WHERE order_number = ?1", ORDER_COLUMNS);
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(order_number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    /// Gets the items of an order in insertion order.
    pub async fn get_items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let mut conn = self.pool.acquire().await?;
        find_items(&mut conn, order_id).await
    }

    /// Counts orders of an outlet, optionally filtered by status.
    pub async fn count_for_outlet(
        &self,
        outlet_id: &str,
        status: Option<OrderStatus>,
    ) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM orders
            WHERE outlet_id = ?1 AND (?2 IS NULL OR status = ?2)
            "#,
        )
        .bind(outlet_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

// =============================================================================
// Transaction-scoped statements
// =============================================================================

/// Inserts the order row. Always the first write of a checkout.
pub(crate) async fn insert_order(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
    debug!(id = %order.id, order_number = %order.order_number, "Inserting order");

    sqlx::query(
        r#"
        INSERT INTO orders (
            id, order_number, outlet_id, user_id, shift_id,
            subtotal_cents, tax_cents, discount_cents, total_cents,
            total_paid_cents, change_cents, payment_method, status, notes,
            created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5,
            ?6, ?7, ?8, ?9,
            ?10, ?11, ?12, ?13, ?14,
            ?15, ?16
        )
        "#,
    )
    .bind(&order.id)
    .bind(&order.order_number)
    .bind(&order.outlet_id)
    .bind(&order.user_id)
    .bind(&order.shift_id)
    .bind(order.subtotal_cents)
    .bind(order.tax_cents)
    .bind(order.discount_cents)
    .bind(order.total_cents)
    .bind(order.total_paid_cents)
    .bind(order.change_cents)
    .bind(order.payment_method)
    .bind(order.status)
    .bind(&order.notes)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Inserts one line. Price and subtotal are a snapshot and never change.
pub(crate) async fn insert_item(conn: &mut SqliteConnection, item: &OrderItem) -> DbResult<()> {
    debug!(order_id = %item.order_id, product_id = %item.product_id, quantity = item.quantity, "Adding order item");

    sqlx::query(
        r#"
        INSERT INTO order_items (
            id, order_id, product_id, quantity, price_cents, subtotal_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&item.id)
    .bind(&item.order_id)
    .bind(&item.product_id)
    .bind(item.quantity)
    .bind(item.price_cents)
    .bind(item.subtotal_cents)
    .bind(item.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Flips a pending order to completed. Returns false if it was not pending.
pub(crate) async fn mark_completed(
    conn: &mut SqliteConnection,
    order_id: &str,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE orders SET status = 'completed', updated_at = ?2
        WHERE id = ?1 AND status = 'pending'
        "#,
    )
    .bind(order_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Claims a completed order for cancellation.
///
/// The status check and the transition are one statement, so of two racing
/// cancellations exactly one sees `true`.
pub(crate) async fn claim_cancellation(
    conn: &mut SqliteConnection,
    order_id: &str,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE orders SET status = 'cancelled', updated_at = ?2
        WHERE id = ?1 AND status = 'completed'
        "#,
    )
    .bind(order_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub(crate) async fn find_order(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> DbResult<Option<Order>> {
    let sql = format!("SELECT {} FROM orders WHERE id = ?1", ORDER_COLUMNS);
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(order)
}

pub(crate) async fn find_items(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> DbResult<Vec<OrderItem>> {
    let items = sqlx::query_as::<_, OrderItem>(
        r#"
        SELECT id, order_id, product_id, quantity, price_cents, subtotal_cents, created_at
        FROM order_items
        WHERE order_id = ?1
        ORDER BY rowid
        "#,
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}
