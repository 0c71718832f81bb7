//! # Cash Register Repository
//!
//! One register per outlet, plus its append-only transaction log.
//!
//! ## Balance Updates
//! ```text
//! debit 31.00, balance 20.00
//!      │
//!      ▼
//! UPDATE ... SET balance = balance - 3100
//!        WHERE outlet_id = ? AND balance >= 3100   ← guard and write are one statement
//! RETURNING id, balance_cents
//!      │
//!      ├── row returned  → write the `remove` record
//!      └── no row        → look up why (missing register / insufficient funds)
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use kasir_core::{CashRegister, CashRegisterTransaction, Money, RegisterStatus};

/// Repository for register reads and register provisioning.
#[derive(Debug, Clone)]
pub struct CashRegisterRepository {
    pool: SqlitePool,
}

impl CashRegisterRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CashRegisterRepository { pool }
    }

    /// Gets the register of an outlet.
    pub async fn get_by_outlet(&self, outlet_id: &str) -> DbResult<Option<CashRegister>> {
        let mut conn = self.pool.acquire().await?;
        find_by_outlet(&mut conn, outlet_id).await
    }

    /// Transaction log of a register, oldest first.
    pub async fn transactions(&self, register_id: &str) -> DbResult<Vec<CashRegisterTransaction>> {
        let transactions = sqlx::query_as::<_, CashRegisterTransaction>(
            r#"
            SELECT id, cash_register_id, shift_id, user_id, type AS transaction_type,
                   amount_cents, reason, created_at
            FROM cash_register_transactions
            WHERE cash_register_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(register_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }

    /// Opens the register of an outlet with a starting float.
    ///
    /// The float is provisioning, not a movement: no transaction is logged.
    pub async fn open(&self, outlet_id: &str, opening_balance: Money) -> DbResult<CashRegister> {
        let now = Utc::now();
        let register = CashRegister {
            id: Uuid::new_v4().to_string(),
            outlet_id: outlet_id.to_string(),
            balance_cents: opening_balance.cents(),
            status: RegisterStatus::Open,
            created_at: now,
            updated_at: now,
        };

        debug!(outlet_id, balance = %opening_balance, "Opening cash register");

        sqlx::query(
            r#"
            INSERT INTO cash_registers (id, outlet_id, balance_cents, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&register.id)
        .bind(&register.outlet_id)
        .bind(register.balance_cents)
        .bind(register.status)
        .bind(register.created_at)
        .bind(register.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(register)
    }
}

// =============================================================================
// Transaction-scoped statements
// =============================================================================

pub(crate) async fn find_by_outlet(
    conn: &mut SqliteConnection,
    outlet_id: &str,
) -> DbResult<Option<CashRegister>> {
    let register = sqlx::query_as::<_, CashRegister>(
        r#"
        SELECT id, outlet_id, balance_cents, status, created_at, updated_at
        FROM cash_registers
        WHERE outlet_id = ?1
        "#,
    )
    .bind(outlet_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(register)
}

/// Adds to the balance. Returns `(register_id, new_balance)`, or `None` if the
/// outlet has no register.
pub(crate) async fn increment_balance(
    conn: &mut SqliteConnection,
    outlet_id: &str,
    amount_cents: i64,
    now: DateTime<Utc>,
) -> DbResult<Option<(String, i64)>> {
    let row: Option<(String, i64)> = sqlx::query_as(
        r#"
        UPDATE cash_registers
        SET balance_cents = balance_cents + ?2, updated_at = ?3
        WHERE outlet_id = ?1
        RETURNING id, balance_cents
        "#,
    )
    .bind(outlet_id)
    .bind(amount_cents)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row)
}

/// Subtracts from the balance only if it covers the amount.
///
/// Returns `None` if the register is missing or the balance is too low.
pub(crate) async fn decrement_balance_if_covered(
    conn: &mut SqliteConnection,
    outlet_id: &str,
    amount_cents: i64,
    now: DateTime<Utc>,
) -> DbResult<Option<(String, i64)>> {
    let row: Option<(String, i64)> = sqlx::query_as(
        r#"
        UPDATE cash_registers
        SET balance_cents = balance_cents - ?2, updated_at = ?3
        WHERE outlet_id = ?1 AND balance_cents >= ?2
        RETURNING id, balance_cents
        "#,
    )
    .bind(outlet_id)
    .bind(amount_cents)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row)
}

pub(crate) async fn insert_transaction(
    conn: &mut SqliteConnection,
    transaction: &CashRegisterTransaction,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO cash_register_transactions (
            id, cash_register_id, shift_id, user_id, type, amount_cents, reason, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&transaction.id)
    .bind(&transaction.cash_register_id)
    .bind(&transaction.shift_id)
    .bind(&transaction.user_id)
    .bind(transaction.transaction_type)
    .bind(transaction.amount_cents)
    .bind(&transaction.reason)
    .bind(transaction.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
