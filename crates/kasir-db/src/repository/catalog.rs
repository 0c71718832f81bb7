//! # Catalog Repository
//!
//! Reference rows the order flow points at: outlets, operators, products and
//! shifts. Owned by the catalog and identity collaborators; the order flow
//! only reads ids. The seed binary and tests use these inserts to provision
//! a working store.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;

/// Repository for reference-table provisioning.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    /// Inserts an outlet and returns its id.
    pub async fn insert_outlet(&self, name: &str) -> DbResult<String> {
        let id = Uuid::new_v4().to_string();
        debug!(id = %id, name, "Inserting outlet");

        sqlx::query("INSERT INTO outlets (id, name, created_at) VALUES (?1, ?2, ?3)")
            .bind(&id)
            .bind(name)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(id)
    }

    /// Inserts an operator and returns its id.
    pub async fn insert_user(&self, name: &str) -> DbResult<String> {
        let id = Uuid::new_v4().to_string();
        debug!(id = %id, name, "Inserting user");

        sqlx::query("INSERT INTO users (id, name, created_at) VALUES (?1, ?2, ?3)")
            .bind(&id)
            .bind(name)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(id)
    }

    /// Inserts a product and returns its id.
    ///
    /// Prices are not stored here: checkouts carry their own unit prices.
    pub async fn insert_product(&self, sku: &str, name: &str) -> DbResult<String> {
        let id = Uuid::new_v4().to_string();
        debug!(id = %id, sku, "Inserting product");

        sqlx::query("INSERT INTO products (id, sku, name, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(&id)
            .bind(sku)
            .bind(name)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(id)
    }

    /// Starts a shift for an operator at an outlet and returns its id.
    pub async fn open_shift(&self, outlet_id: &str, user_id: &str) -> DbResult<String> {
        let id = Uuid::new_v4().to_string();
        debug!(id = %id, outlet_id, user_id, "Opening shift");

        sqlx::query(
            "INSERT INTO shifts (id, outlet_id, user_id, started_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&id)
        .bind(outlet_id)
        .bind(user_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    pub async fn close_shift(&self, shift_id: &str, at: DateTime<Utc>) -> DbResult<bool> {
        let result = sqlx::query("UPDATE shifts SET ended_at = ?2 WHERE id = ?1 AND ended_at IS NULL")
            .bind(shift_id)
            .bind(at)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn count_products(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
