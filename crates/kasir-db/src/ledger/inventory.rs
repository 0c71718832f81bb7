//! # Inventory Ledger
//!
//! Every stock movement updates the (outlet, product) row and appends exactly
//! one history record in the same transaction.
//!
//! ## Apply
//! ```text
//! StockChange { delta: -2, type: sale }
//!      │
//!      ▼
//! UPDATE inventories SET quantity = quantity - 2 ... RETURNING quantity
//!      │
//!      ├── row returned (after = 8)  → history { before: 10, after: 8, change: -2 }
//!      │
//!      └── no row
//!           ├── pair not stocked   → Lenient: skip   │ Strict: InventoryNotFound
//!           └── below zero refused → InsufficientStock
//! ```

use chrono::Utc;
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, warn};
use uuid::Uuid;

use kasir_core::validation::{validate_id, validate_stock_delta};
use kasir_core::{CoreError, InventoryHistory, LedgerPolicy, StockChange, StockingPolicy};

use crate::error::PosResult;
use crate::repository::inventory::{self, InventoryRepository};

/// Stock movements with an audit trail.
#[derive(Debug, Clone)]
pub struct InventoryLedger {
    pool: SqlitePool,
    policy: LedgerPolicy,
}

impl InventoryLedger {
    pub fn new(pool: SqlitePool, policy: LedgerPolicy) -> Self {
        InventoryLedger { pool, policy }
    }

    pub fn policy(&self) -> LedgerPolicy {
        self.policy
    }

    /// Applies one stock change on the caller's transaction.
    ///
    /// ## Returns
    /// * `Ok(Some(history))` - Quantity updated and history appended
    /// * `Ok(None)` - Pair not stocked at the outlet and the policy is lenient
    /// * `Err(..)` - Zero or unrepresentable delta, strict policy with no
    ///   stock row, or refused negative stock
    pub async fn apply(
        &self,
        conn: &mut SqliteConnection,
        change: &StockChange,
    ) -> PosResult<Option<InventoryHistory>> {
        validate_id("outlet_id", &change.outlet_id)?;
        validate_id("product_id", &change.product_id)?;
        validate_id("user_id", &change.user_id)?;
        validate_stock_delta(change.delta)?;

        let now = Utc::now();
        let updated = inventory::apply_delta(
            conn,
            &change.outlet_id,
            &change.product_id,
            change.delta,
            self.policy.allow_negative_stock,
            now,
        )
        .await?;

        let after = match updated {
            Some(after) => after,
            None => {
                let current =
                    inventory::current_quantity(conn, &change.outlet_id, &change.product_id)
                        .await?;
                return match current {
                    None if self.policy.stocking == StockingPolicy::Lenient => {
                        debug!(
                            outlet_id = %change.outlet_id,
                            product_id = %change.product_id,
                            "Product not stocked at outlet, skipping"
                        );
                        Ok(None)
                    }
                    None => Err(CoreError::InventoryNotFound {
                        outlet_id: change.outlet_id.clone(),
                        product_id: change.product_id.clone(),
                    }
                    .into()),
                    Some(available) => Err(CoreError::InsufficientStock {
                        product_id: change.product_id.clone(),
                        available,
                        requested: change.delta.abs(),
                    }
                    .into()),
                };
            }
        };

        let history = InventoryHistory {
            id: Uuid::new_v4().to_string(),
            outlet_id: change.outlet_id.clone(),
            product_id: change.product_id.clone(),
            quantity_before: after - change.delta,
            quantity_after: after,
            quantity_change: change.delta,
            history_type: change.history_type,
            notes: change.note.clone(),
            user_id: change.user_id.clone(),
            created_at: now,
        };

        inventory::insert_history(conn, &history).await?;

        debug!(
            outlet_id = %history.outlet_id,
            product_id = %history.product_id,
            before = history.quantity_before,
            after = history.quantity_after,
            "Stock updated"
        );

        Ok(Some(history))
    }

    /// Applies a single change in its own transaction.
    ///
    /// For restocks, adjustments and stock takes outside the order flow.
    pub async fn record(&self, change: &StockChange) -> PosResult<Option<InventoryHistory>> {
        let mut tx = self.pool.begin().await?;

        match self.apply(&mut *tx, change).await {
            Ok(history) => {
                tx.commit().await?;
                Ok(history)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }

    /// Replays the history of one pair against the live quantity.
    ///
    /// Discrepancies are reported, not raised: the audit trail is append-only
    /// so the caller decides how to correct it (usually a stocktake).
    pub async fn verify_history(
        &self,
        outlet_id: &str,
        product_id: &str,
    ) -> PosResult<StockReconciliation> {
        let repo = InventoryRepository::new(self.pool.clone());
        let history = repo.history(outlet_id, product_id).await?;
        let live_quantity = repo.quantity(outlet_id, product_id).await?;

        Ok(reconcile(
            outlet_id,
            product_id,
            &history,
            live_quantity,
        ))
    }
}

// =============================================================================
// Reconciliation
// =============================================================================

/// Outcome of replaying a stock history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockReconciliation {
    pub outlet_id: String,
    pub product_id: String,
    pub records: usize,
    /// `None` when the pair has no stock row.
    pub live_quantity: Option<i64>,
    pub discrepancies: Vec<StockDiscrepancy>,
}

impl StockReconciliation {
    pub fn is_clean(&self) -> bool {
        self.discrepancies.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StockDiscrepancy {
    /// `after != before + change` on a single record.
    InconsistentRecord { history_id: String },
    /// A record does not start where the previous one ended.
    BrokenChain {
        history_id: String,
        expected_before: i64,
        actual_before: i64,
    },
    /// The last record does not end at the live quantity.
    LiveQuantityMismatch { expected: i64, actual: Option<i64> },
}

fn reconcile(
    outlet_id: &str,
    product_id: &str,
    history: &[InventoryHistory],
    live_quantity: Option<i64>,
) -> StockReconciliation {
    let mut discrepancies = Vec::new();
    let mut previous_after: Option<i64> = None;

    for record in history {
        if !record.is_consistent() {
            discrepancies.push(StockDiscrepancy::InconsistentRecord {
                history_id: record.id.clone(),
            });
        }
        if let Some(expected) = previous_after {
            if record.quantity_before != expected {
                discrepancies.push(StockDiscrepancy::BrokenChain {
                    history_id: record.id.clone(),
                    expected_before: expected,
                    actual_before: record.quantity_before,
                });
            }
        }
        previous_after = Some(record.quantity_after);
    }

    if let Some(expected) = previous_after {
        if live_quantity != Some(expected) {
            discrepancies.push(StockDiscrepancy::LiveQuantityMismatch {
                expected,
                actual: live_quantity,
            });
        }
    }

    StockReconciliation {
        outlet_id: outlet_id.to_string(),
        product_id: product_id.to_string(),
        records: history.len(),
        live_quantity,
        discrepancies,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Store;
    use kasir_core::{ErrorKind, HistoryType};

    fn change(store: &Store, product: usize, delta: i64, history_type: HistoryType) -> StockChange {
        StockChange {
            outlet_id: store.outlet_id.clone(),
            product_id: store.products[product].clone(),
            delta,
            history_type,
            user_id: store.user_id.clone(),
            note: Some("test".to_string()),
        }
    }

    #[tokio::test]
    async fn test_record_writes_one_history_row() {
        let store = Store::new(1).await;
        store.stock(0, 10).await;
        let ledger = store.db.inventory_ledger(LedgerPolicy::default());

        let history = ledger
            .record(&change(&store, 0, -3, HistoryType::Sale))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(history.quantity_before, 10);
        assert_eq!(history.quantity_after, 7);
        assert_eq!(history.quantity_change, -3);
        assert_eq!(history.quantity_after - history.quantity_before, history.quantity_change);
        assert_eq!(store.quantity(0).await, Some(7));
        assert_eq!(store.count("inventory_histories").await, 1);
    }

    #[tokio::test]
    async fn test_lenient_skips_unstocked_product() {
        let store = Store::new(1).await;
        let ledger = store.db.inventory_ledger(LedgerPolicy::default());

        let result = ledger
            .record(&change(&store, 0, -1, HistoryType::Sale))
            .await
            .unwrap();

        assert!(result.is_none());
        assert_eq!(store.quantity(0).await, None);
        assert_eq!(store.count("inventory_histories").await, 0);
    }

    #[tokio::test]
    async fn test_strict_rejects_unstocked_product() {
        let store = Store::new(1).await;
        let ledger = store.db.inventory_ledger(LedgerPolicy {
            stocking: StockingPolicy::Strict,
            allow_negative_stock: true,
        });

        let err = ledger
            .record(&change(&store, 0, -1, HistoryType::Sale))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(store.count("inventory_histories").await, 0);
    }

    #[tokio::test]
    async fn test_negative_stock_allowed_by_default() {
        let store = Store::new(1).await;
        store.stock(0, 1).await;
        let ledger = store.db.inventory_ledger(LedgerPolicy::default());

        let history = ledger
            .record(&change(&store, 0, -4, HistoryType::Sale))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(history.quantity_after, -3);
        assert_eq!(store.quantity(0).await, Some(-3));
    }

    #[tokio::test]
    async fn test_negative_stock_refused_when_disallowed() {
        let store = Store::new(1).await;
        store.stock(0, 1).await;
        let ledger = store.db.inventory_ledger(LedgerPolicy {
            stocking: StockingPolicy::Lenient,
            allow_negative_stock: false,
        });

        let err = ledger
            .record(&change(&store, 0, -4, HistoryType::Sale))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            crate::PosError::Core(CoreError::InsufficientStock { available: 1, requested: 4, .. })
        ));
        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
        assert_eq!(store.quantity(0).await, Some(1));
        assert_eq!(store.count("inventory_histories").await, 0);
    }

    #[tokio::test]
    async fn test_restock_into_negative_is_not_refused() {
        let store = Store::new(1).await;
        store.stock(0, -10).await;
        let ledger = store.db.inventory_ledger(LedgerPolicy {
            stocking: StockingPolicy::Lenient,
            allow_negative_stock: false,
        });

        let history = ledger
            .record(&change(&store, 0, 4, HistoryType::Purchase))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(history.quantity_after, -6);
    }

    #[tokio::test]
    async fn test_zero_and_unbounded_deltas_are_rejected() {
        let store = Store::new(1).await;
        store.stock(0, 5).await;
        let ledger = store.db.inventory_ledger(LedgerPolicy {
            stocking: StockingPolicy::Lenient,
            allow_negative_stock: false,
        });

        for delta in [0, i64::MIN] {
            let err = ledger
                .record(&change(&store, 0, delta, HistoryType::Adjustment))
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ValidationError, "delta {}", delta);
        }

        assert_eq!(store.quantity(0).await, Some(5));
        assert_eq!(store.count("inventory_histories").await, 0);
    }

    #[tokio::test]
    async fn test_verify_history_clean_chain() {
        let store = Store::new(1).await;
        store.stock(0, 5).await;
        let ledger = store.db.inventory_ledger(LedgerPolicy::default());

        ledger.record(&change(&store, 0, 20, HistoryType::Purchase)).await.unwrap();
        ledger.record(&change(&store, 0, -2, HistoryType::Sale)).await.unwrap();
        ledger.record(&change(&store, 0, -1, HistoryType::Adjustment)).await.unwrap();

        let report = ledger
            .verify_history(&store.outlet_id, &store.products[0])
            .await
            .unwrap();

        assert!(report.is_clean(), "{:?}", report.discrepancies);
        assert_eq!(report.records, 3);
        assert_eq!(report.live_quantity, Some(22));
    }

    #[tokio::test]
    async fn test_verify_history_detects_drift() {
        let store = Store::new(1).await;
        store.stock(0, 5).await;
        let ledger = store.db.inventory_ledger(LedgerPolicy::default());
        ledger.record(&change(&store, 0, -2, HistoryType::Sale)).await.unwrap();

        // A write that bypassed the ledger
        sqlx::query("UPDATE inventories SET quantity = 100")
            .execute(store.db.pool())
            .await
            .unwrap();

        let report = ledger
            .verify_history(&store.outlet_id, &store.products[0])
            .await
            .unwrap();

        assert_eq!(
            report.discrepancies,
            vec![StockDiscrepancy::LiveQuantityMismatch {
                expected: 3,
                actual: Some(100),
            }]
        );
    }

    #[test]
    fn test_reconcile_reports_broken_chain() {
        let record = |id: &str, before: i64, after: i64| InventoryHistory {
            id: id.to_string(),
            outlet_id: "o".into(),
            product_id: "p".into(),
            quantity_before: before,
            quantity_after: after,
            quantity_change: after - before,
            history_type: HistoryType::Sale,
            notes: None,
            user_id: "u".into(),
            created_at: Utc::now(),
        };

        let history = vec![record("h1", 10, 8), record("h2", 7, 6)];
        let report = reconcile("o", "p", &history, Some(6));

        assert_eq!(
            report.discrepancies,
            vec![StockDiscrepancy::BrokenChain {
                history_id: "h2".into(),
                expected_before: 8,
                actual_before: 7,
            }]
        );
    }

    #[tokio::test]
    async fn test_history_is_append_only() {
        let store = Store::new(1).await;
        store.stock(0, 5).await;
        let ledger = store.db.inventory_ledger(LedgerPolicy::default());
        ledger.record(&change(&store, 0, -1, HistoryType::Sale)).await.unwrap();

        let update = sqlx::query("UPDATE inventory_histories SET quantity_change = 0")
            .execute(store.db.pool())
            .await;
        let delete = sqlx::query("DELETE FROM inventory_histories")
            .execute(store.db.pool())
            .await;

        assert!(update.is_err());
        assert!(delete.is_err());
        assert_eq!(store.count("inventory_histories").await, 1);
    }
}
