//! # Cash Register Account
//!
//! Balance changes of an outlet's register, each logged as one `add` or
//! `remove` transaction in the same database transaction.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, warn};
use uuid::Uuid;

use kasir_core::validation::{validate_cash_amount, validate_id};
use kasir_core::{CashMovement, CashRegisterTransaction, CashTransactionType, CoreError, Money};

use crate::error::PosResult;
use crate::repository::cash_register::{self, CashRegisterRepository};

/// Credits and debits against the register of an outlet.
#[derive(Debug, Clone)]
pub struct CashRegisterAccount {
    pool: SqlitePool,
}

impl CashRegisterAccount {
    pub fn new(pool: SqlitePool) -> Self {
        CashRegisterAccount { pool }
    }

    /// Adds cash on the caller's transaction.
    pub async fn credit(
        &self,
        conn: &mut SqliteConnection,
        outlet_id: &str,
        movement: &CashMovement,
    ) -> PosResult<CashRegisterTransaction> {
        validate_movement(outlet_id, movement)?;

        let now = Utc::now();
        let (register_id, balance) =
            cash_register::increment_balance(conn, outlet_id, movement.amount.cents(), now)
                .await?
                .ok_or_else(|| CoreError::CashRegisterMissing {
                    outlet_id: outlet_id.to_string(),
                })?;

        let transaction = log_movement(conn, register_id, CashTransactionType::Add, movement).await?;
        debug!(outlet_id, amount = %movement.amount, balance = %Money::from_cents(balance), "Cash added");

        Ok(transaction)
    }

    /// Removes cash on the caller's transaction.
    ///
    /// ## Errors
    /// * `InsufficientFunds` - Balance is below the amount; balance unchanged
    /// * `CashRegisterMissing` - Outlet has no register
    pub async fn debit(
        &self,
        conn: &mut SqliteConnection,
        outlet_id: &str,
        movement: &CashMovement,
    ) -> PosResult<CashRegisterTransaction> {
        validate_movement(outlet_id, movement)?;

        let now = Utc::now();
        let requested = movement.amount.cents();
        let updated =
            cash_register::decrement_balance_if_covered(conn, outlet_id, requested, now).await?;

        let (register_id, balance) = match updated {
            Some(row) => row,
            None => {
                let register = cash_register::find_by_outlet(conn, outlet_id).await?;
                return Err(match register {
                    None => CoreError::CashRegisterMissing {
                        outlet_id: outlet_id.to_string(),
                    },
                    Some(register) => CoreError::InsufficientFunds {
                        available: register.balance_cents,
                        requested,
                    },
                }
                .into());
            }
        };

        let transaction =
            log_movement(conn, register_id, CashTransactionType::Remove, movement).await?;
        debug!(outlet_id, amount = %movement.amount, balance = %Money::from_cents(balance), "Cash removed");

        Ok(transaction)
    }

    /// Adds cash in its own transaction (float top-ups, pay-ins).
    pub async fn add_cash(
        &self,
        outlet_id: &str,
        movement: &CashMovement,
    ) -> PosResult<CashRegisterTransaction> {
        let mut tx = self.pool.begin().await?;

        match self.credit(&mut *tx, outlet_id, movement).await {
            Ok(transaction) => {
                tx.commit().await?;
                Ok(transaction)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }

    /// Removes cash in its own transaction (payouts, bank drops).
    pub async fn subtract_cash(
        &self,
        outlet_id: &str,
        movement: &CashMovement,
    ) -> PosResult<CashRegisterTransaction> {
        let mut tx = self.pool.begin().await?;

        match self.debit(&mut *tx, outlet_id, movement).await {
            Ok(transaction) => {
                tx.commit().await?;
                Ok(transaction)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }

    /// Current balance of the outlet's register.
    pub async fn balance(&self, outlet_id: &str) -> PosResult<Money> {
        let register = CashRegisterRepository::new(self.pool.clone())
            .get_by_outlet(outlet_id)
            .await?
            .ok_or_else(|| CoreError::CashRegisterMissing {
                outlet_id: outlet_id.to_string(),
            })?;

        Ok(register.balance())
    }

    /// Transaction log of the outlet's register, oldest first.
    pub async fn transactions(&self, outlet_id: &str) -> PosResult<Vec<CashRegisterTransaction>> {
        let repo = CashRegisterRepository::new(self.pool.clone());
        let register = repo
            .get_by_outlet(outlet_id)
            .await?
            .ok_or_else(|| CoreError::CashRegisterMissing {
                outlet_id: outlet_id.to_string(),
            })?;

        Ok(repo.transactions(&register.id).await?)
    }
}

fn validate_movement(outlet_id: &str, movement: &CashMovement) -> PosResult<()> {
    validate_id("outlet_id", outlet_id)?;
    validate_cash_amount(movement.amount)?;
    validate_id("user_id", &movement.user_id)?;
    validate_id("shift_id", &movement.shift_id)?;
    validate_id("reason", &movement.reason)?;
    Ok(())
}

async fn log_movement(
    conn: &mut SqliteConnection,
    register_id: String,
    transaction_type: CashTransactionType,
    movement: &CashMovement,
) -> PosResult<CashRegisterTransaction> {
    let transaction = CashRegisterTransaction {
        id: Uuid::new_v4().to_string(),
        cash_register_id: register_id,
        shift_id: movement.shift_id.clone(),
        user_id: movement.user_id.clone(),
        transaction_type,
        amount_cents: movement.amount.cents(),
        reason: movement.reason.clone(),
        created_at: Utc::now(),
    };

    cash_register::insert_transaction(conn, &transaction).await?;
    Ok(transaction)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::testing::Store;
    use crate::PosError;
    use kasir_core::ErrorKind;

    fn movement(store: &Store, cents: i64, reason: &str) -> CashMovement {
        CashMovement {
            amount: Money::from_cents(cents),
            user_id: store.user_id.clone(),
            shift_id: store.shift_id.clone(),
            reason: reason.to_string(),
        }
    }

    #[tokio::test]
    async fn test_add_and_subtract_cash() {
        let store = Store::new(0).await;
        store.open_register(10_000).await;
        let account = store.db.cash_account();

        let added = account
            .add_cash(&store.outlet_id, &movement(&store, 2_500, "Float top-up"))
            .await
            .unwrap();
        let removed = account
            .subtract_cash(&store.outlet_id, &movement(&store, 4_000, "Bank drop"))
            .await
            .unwrap();

        assert_eq!(added.transaction_type, CashTransactionType::Add);
        assert_eq!(removed.transaction_type, CashTransactionType::Remove);
        assert_eq!(removed.amount_cents, 4_000);
        assert_eq!(
            account.balance(&store.outlet_id).await.unwrap(),
            Money::from_cents(8_500)
        );

        let log = account.transactions(&store.outlet_id).await.unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].reason, "Float top-up");
        assert_eq!(log.iter().map(|t| t.signed_amount()).sum::<Money>(), Money::from_cents(-1_500));
    }

    #[tokio::test]
    async fn test_debit_guard_leaves_balance_unchanged() {
        let store = Store::new(0).await;
        store.open_register(2_000).await;
        let account = store.db.cash_account();

        let err = account
            .subtract_cash(&store.outlet_id, &movement(&store, 3_100, "Refund"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PosError::Core(CoreError::InsufficientFunds {
                available: 2_000,
                requested: 3_100
            })
        ));
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
        assert_eq!(store.balance().await, 2_000);
        assert_eq!(store.count("cash_register_transactions").await, 0);
    }

    #[tokio::test]
    async fn test_debit_of_exact_balance_reaches_zero() {
        let store = Store::new(0).await;
        store.open_register(2_000).await;

        store
            .db
            .cash_account()
            .subtract_cash(&store.outlet_id, &movement(&store, 2_000, "Close out"))
            .await
            .unwrap();

        assert_eq!(store.balance().await, 0);
    }

    #[tokio::test]
    async fn test_non_positive_amount_rejected() {
        let store = Store::new(0).await;
        store.open_register(2_000).await;
        let account = store.db.cash_account();

        for cents in [0, -500] {
            let err = account
                .add_cash(&store.outlet_id, &movement(&store, cents, "Oops"))
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ValidationError);
        }
        assert_eq!(store.balance().await, 2_000);
    }

    #[tokio::test]
    async fn test_missing_register() {
        let store = Store::new(0).await;
        let account = store.db.cash_account();

        let err = account
            .add_cash(&store.outlet_id, &movement(&store, 100, "Float"))
            .await
            .unwrap_err();
        assert!(matches!(err, PosError::Core(CoreError::CashRegisterMissing { .. })));
        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);

        let err = account
            .subtract_cash(&store.outlet_id, &movement(&store, 100, "Payout"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
    }

    #[tokio::test]
    async fn test_transactions_are_append_only() {
        let store = Store::new(0).await;
        store.open_register(0).await;
        store
            .db
            .cash_account()
            .add_cash(&store.outlet_id, &movement(&store, 100, "Float"))
            .await
            .unwrap();

        let update = sqlx::query("UPDATE cash_register_transactions SET amount_cents = 1")
            .execute(store.db.pool())
            .await;
        let delete = sqlx::query("DELETE FROM cash_register_transactions")
            .execute(store.db.pool())
            .await;

        assert!(update.is_err());
        assert!(delete.is_err());
    }

    #[tokio::test]
    async fn test_concurrent_debits_cannot_overdraw() {
        let path = std::env::temp_dir().join(format!("kasir-debit-{}.db", Uuid::new_v4()));
        let db = Database::new(DbConfig::new(path.clone()).max_connections(4))
            .await
            .unwrap();
        let store = Store::on(db, 0).await;
        store.open_register(10_000).await;

        let mut handles = Vec::new();
        for _ in 0..4 {
            let account = store.db.cash_account();
            let outlet_id = store.outlet_id.clone();
            let payout = movement(&store, 3_000, "Payout");
            handles.push(tokio::spawn(async move {
                account.subtract_cash(&outlet_id, &payout).await
            }));
        }

        let mut succeeded = 0;
        let mut refused = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(err) => {
                    assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
                    refused += 1;
                }
            }
        }

        assert_eq!(succeeded, 3);
        assert_eq!(refused, 1);
        assert_eq!(store.balance().await, 1_000);
        assert_eq!(store.count("cash_register_transactions").await, 3);

        store.db.close().await;
        let _ = std::fs::remove_file(&path);
    }
}
