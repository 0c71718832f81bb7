//! # Order Transaction Coordinator
//!
//! Checkout and cancellation as single all-or-nothing database transactions.
//!
//! ## Checkout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Validating             shape, quantities, payment method                │
//! │       │                                                                  │
//! │       ▼                                                                  │
//! │  Computing              subtotal, total, total_paid, change              │
//! │       │                                                                  │
//! │       ▼  BEGIN                                                           │
//! │  Persisting             INSERT order (pending) ← first write             │
//! │       │                                                                  │
//! │       ▼                                                                  │
//! │  ApplyingSideEffects    per line: INSERT item, stock -qty + history      │
//! │       │                 register +total + `add` record                   │
//! │       │                 UPDATE order → completed                         │
//! │       ▼  COMMIT                                                          │
//! │  Completed                                                               │
//! │                                                                          │
//! │  Any error after BEGIN → ROLLBACK, stage logged, nothing persisted       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Cancellation
//! ```text
//! BEGIN
//!   UPDATE orders SET status = 'cancelled' WHERE status = 'completed'  ← claim
//!   per line: stock +qty + history
//!   register -total + `remove` record (InsufficientFunds aborts)
//! COMMIT
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use std::fmt;
use tracing::{info, warn};
use uuid::Uuid;

use kasir_core::pricing::{compute_totals, line_subtotal};
use kasir_core::validation::{validate_checkout, validate_id};
use kasir_core::{
    CashMovement, CheckoutRequest, CoreError, HistoryType, LedgerPolicy, Money, Order,
    OrderDetail, OrderItem, OrderStatus, PaymentMethod, StockChange, ORDER_NUMBER_PREFIX,
};

use crate::error::{DbError, PosResult};
use crate::ledger::{CashRegisterAccount, InventoryLedger};
use crate::repository::{cash_register, order as orders};

/// Where a checkout was when it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStage {
    Validating,
    Computing,
    Persisting,
    ApplyingSideEffects,
    Completed,
}

impl fmt::Display for CheckoutStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CheckoutStage::Validating => "validating",
            CheckoutStage::Computing => "computing",
            CheckoutStage::Persisting => "persisting",
            CheckoutStage::ApplyingSideEffects => "applying-side-effects",
            CheckoutStage::Completed => "completed",
        };
        f.write_str(label)
    }
}

/// Runs checkouts and cancellations against the ledgers.
#[derive(Debug, Clone)]
pub struct OrderTransactionCoordinator {
    pool: SqlitePool,
    inventory: InventoryLedger,
    cash: CashRegisterAccount,
    payment_methods: Vec<PaymentMethod>,
}

impl OrderTransactionCoordinator {
    pub fn new(pool: SqlitePool, policy: LedgerPolicy, payment_methods: Vec<PaymentMethod>) -> Self {
        OrderTransactionCoordinator {
            inventory: InventoryLedger::new(pool.clone(), policy),
            cash: CashRegisterAccount::new(pool.clone()),
            pool,
            payment_methods,
        }
    }

    pub fn payment_methods(&self) -> &[PaymentMethod] {
        &self.payment_methods
    }

    /// Creates a completed order, moving stock and cash with it.
    ///
    /// ## Arguments
    /// * `request` - Lines, prices and payment as submitted at the till
    /// * `user_id` - Operator taking the payment
    ///
    /// ## Returns
    /// The persisted order and its items. On error nothing was written.
    pub async fn create_order(
        &self,
        request: &CheckoutRequest,
        user_id: &str,
    ) -> PosResult<OrderDetail> {
        let mut stage = CheckoutStage::Validating;

        match self.checkout(request, user_id, &mut stage).await {
            Ok(detail) => {
                info!(
                    stage = %stage,
                    order_id = %detail.order.id,
                    order_number = %detail.order.order_number,
                    outlet_id = %detail.order.outlet_id,
                    total = %detail.order.total(),
                    items = detail.items.len(),
                    "Order completed"
                );
                Ok(detail)
            }
            Err(err) => {
                warn!(
                    stage = %stage,
                    outlet_id = %request.outlet_id,
                    error = %err,
                    "Checkout rolled back"
                );
                Err(err)
            }
        }
    }

    async fn checkout(
        &self,
        request: &CheckoutRequest,
        user_id: &str,
        stage: &mut CheckoutStage,
    ) -> PosResult<OrderDetail> {
        validate_id("user_id", user_id)?;
        validate_checkout(request, &self.payment_methods)?;

        *stage = CheckoutStage::Computing;
        let totals = compute_totals(
            &request.items,
            Money::from_cents(request.tax_cents.unwrap_or(0)),
            Money::from_cents(request.discount_cents.unwrap_or(0)),
            request.payment_method,
            request.total_paid_cents.map(Money::from_cents),
        )?;

        let now = Utc::now();
        let mut order = Order {
            id: Uuid::new_v4().to_string(),
            order_number: generate_order_number(now),
            outlet_id: request.outlet_id.clone(),
            user_id: user_id.to_string(),
            shift_id: request.shift_id.clone(),
            subtotal_cents: totals.subtotal.cents(),
            tax_cents: totals.tax.cents(),
            discount_cents: totals.discount.cents(),
            total_cents: totals.total.cents(),
            total_paid_cents: totals.total_paid.cents(),
            change_cents: totals.change.cents(),
            payment_method: request.payment_method,
            status: OrderStatus::Pending,
            notes: request.notes.clone(),
            created_at: now,
            updated_at: now,
        };

        let mut items = Vec::with_capacity(request.items.len());
        for line in &request.items {
            items.push(OrderItem {
                id: Uuid::new_v4().to_string(),
                order_id: order.id.clone(),
                product_id: line.product_id.clone(),
                quantity: line.quantity,
                price_cents: line.price_cents,
                subtotal_cents: line_subtotal(line)?.cents(),
                created_at: now,
            });
        }

        let mut tx = self.pool.begin().await?;

        if let Err(err) = self.persist_checkout(&mut *tx, &order, &items, stage).await {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "Rollback failed");
            }
            return Err(err);
        }

        tx.commit().await?;

        *stage = CheckoutStage::Completed;
        order.status = OrderStatus::Completed;
        Ok(OrderDetail { order, items })
    }

    async fn persist_checkout(
        &self,
        conn: &mut SqliteConnection,
        order: &Order,
        items: &[OrderItem],
        stage: &mut CheckoutStage,
    ) -> PosResult<()> {
        *stage = CheckoutStage::Persisting;
        orders::insert_order(conn, order).await?;

        *stage = CheckoutStage::ApplyingSideEffects;
        let note = format!("POS sale, invoice #{}", order.order_number);

        for item in items {
            orders::insert_item(conn, item).await?;
            self.inventory
                .apply(
                    conn,
                    &StockChange {
                        outlet_id: order.outlet_id.clone(),
                        product_id: item.product_id.clone(),
                        delta: -item.quantity,
                        history_type: HistoryType::Sale,
                        user_id: order.user_id.clone(),
                        note: Some(note.clone()),
                    },
                )
                .await?;
        }

        if order.total().is_positive() {
            let movement = CashMovement {
                amount: order.total(),
                user_id: order.user_id.clone(),
                shift_id: order.shift_id.clone(),
                reason: note,
            };
            self.cash.credit(conn, &order.outlet_id, &movement).await?;
        } else if cash_register::find_by_outlet(conn, &order.outlet_id)
            .await?
            .is_none()
        {
            return Err(CoreError::CashRegisterMissing {
                outlet_id: order.outlet_id.clone(),
            }
            .into());
        }

        if !orders::mark_completed(conn, &order.id, Utc::now()).await? {
            return Err(DbError::TransactionFailed(format!(
                "order {} left the pending state mid-checkout",
                order.id
            ))
            .into());
        }

        Ok(())
    }

    /// Cancels a completed order, returning its stock and cash.
    ///
    /// ## Arguments
    /// * `order_id` - Order to cancel
    /// * `user_id` - Operator performing the cancellation
    ///
    /// ## Errors
    /// * `OrderNotFound` - No such order
    /// * `InvalidOrderStatus` - Order is not `completed`
    /// * `InsufficientFunds` - Register cannot pay the total back
    pub async fn cancel_order(&self, order_id: &str, user_id: &str) -> PosResult<OrderDetail> {
        validate_id("order_id", order_id)?;
        validate_id("user_id", user_id)?;

        let mut tx = self.pool.begin().await?;

        match self.cancel_in(&mut *tx, order_id, user_id).await {
            Ok(detail) => {
                tx.commit().await?;
                info!(
                    order_id = %detail.order.id,
                    order_number = %detail.order.order_number,
                    refunded = %detail.order.total(),
                    "Order cancelled"
                );
                Ok(detail)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                warn!(order_id, error = %err, "Cancellation rolled back");
                Err(err)
            }
        }
    }

    async fn cancel_in(
        &self,
        conn: &mut SqliteConnection,
        order_id: &str,
        user_id: &str,
    ) -> PosResult<OrderDetail> {
        if !orders::claim_cancellation(conn, order_id, Utc::now()).await? {
            return Err(match orders::find_order(conn, order_id).await? {
                None => CoreError::OrderNotFound(order_id.to_string()),
                Some(order) => CoreError::InvalidOrderStatus {
                    order_id: order_id.to_string(),
                    current_status: order.status.to_string(),
                },
            }
            .into());
        }

        let order = orders::find_order(conn, order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;
        let items = orders::find_items(conn, order_id).await?;

        let note = format!("Order cancellation #{}", order.order_number);

        // Returns are logged as `sale` movements with a positive change.
        for item in &items {
            self.inventory
                .apply(
                    conn,
                    &StockChange {
                        outlet_id: order.outlet_id.clone(),
                        product_id: item.product_id.clone(),
                        delta: item.quantity,
                        history_type: HistoryType::Sale,
                        user_id: user_id.to_string(),
                        note: Some(note.clone()),
                    },
                )
                .await?;
        }

        if order.total().is_positive() {
            let movement = CashMovement {
                amount: order.total(),
                user_id: user_id.to_string(),
                shift_id: order.shift_id.clone(),
                reason: note,
            };
            self.cash.debit(conn, &order.outlet_id, &movement).await?;
        }

        Ok(OrderDetail { order, items })
    }

    /// Gets an order with its items.
    pub async fn get_order(&self, order_id: &str) -> PosResult<OrderDetail> {
        let order = self
            .orders()
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;

        self.with_items(order).await
    }

    /// Gets an order by its invoice number.
    pub async fn find_by_number(&self, order_number: &str) -> PosResult<OrderDetail> {
        let order = self
            .orders()
            .get_by_number(order_number)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_number.to_string()))?;

        self.with_items(order).await
    }

    async fn with_items(&self, order: Order) -> PosResult<OrderDetail> {
        let items = self.orders().get_items(&order.id).await?;
        Ok(OrderDetail { order, items })
    }

    fn orders(&self) -> orders::OrderRepository {
        orders::OrderRepository::new(self.pool.clone())
    }
}

/// `INV-<yyyymmddHHMMSS>-<8 hex>`, e.g. `INV-20260131142501-9F3A06C2`.
fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().as_u128() as u32;
    format!(
        "{}-{}-{:08X}",
        ORDER_NUMBER_PREFIX,
        now.format("%Y%m%d%H%M%S"),
        suffix
    )
}

// =============================================================================
// Unit Tests
// =============================================================================
