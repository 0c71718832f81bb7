//! Fixtures shared by the database tests.

use kasir_core::{CheckoutItem, CheckoutRequest, Money, PaymentMethod};

use crate::pool::{Database, DbConfig};

/// An outlet with one operator on shift and a few products.
pub(crate) struct Store {
    pub db: Database,
    pub outlet_id: String,
    pub user_id: String,
    pub shift_id: String,
    pub products: Vec<String>,
}

impl Store {
    pub async fn new(product_count: usize) -> Store {
        Store::on(Database::new(DbConfig::in_memory()).await.unwrap(), product_count).await
    }

    pub async fn on(db: Database, product_count: usize) -> Store {
        let catalog = db.catalog();
        let outlet_id = catalog.insert_outlet("Toko Pusat").await.unwrap();
        let user_id = catalog.insert_user("Sari").await.unwrap();
        let shift_id = catalog.open_shift(&outlet_id, &user_id).await.unwrap();

        let mut products = Vec::with_capacity(product_count);
        for i in 0..product_count {
            let id = catalog
                .insert_product(&format!("SKU-{:03}", i), &format!("Product {}", i))
                .await
                .unwrap();
            products.push(id);
        }

        Store {
            db,
            outlet_id,
            user_id,
            shift_id,
            products,
        }
    }

    pub async fn open_register(&self, balance_cents: i64) {
        self.db
            .cash_registers()
            .open(&self.outlet_id, Money::from_cents(balance_cents))
            .await
            .unwrap();
    }

    pub async fn stock(&self, product: usize, quantity: i64) {
        self.db
            .inventory()
            .create(&self.outlet_id, &self.products[product], quantity)
            .await
            .unwrap();
    }

    pub async fn quantity(&self, product: usize) -> Option<i64> {
        self.db
            .inventory()
            .quantity(&self.outlet_id, &self.products[product])
            .await
            .unwrap()
    }

    pub async fn balance(&self) -> i64 {
        self.db
            .cash_registers()
            .get_by_outlet(&self.outlet_id)
            .await
            .unwrap()
            .map(|r| r.balance_cents)
            .unwrap()
    }

    /// Checkout of `(product index, quantity, unit price)` lines.
    pub fn checkout(&self, lines: &[(usize, i64, i64)], method: PaymentMethod) -> CheckoutRequest {
        CheckoutRequest {
            outlet_id: self.outlet_id.clone(),
            shift_id: self.shift_id.clone(),
            items: lines
                .iter()
                .map(|&(product, quantity, price_cents)| CheckoutItem {
                    product_id: self.products[product].clone(),
                    quantity,
                    price_cents,
                })
                .collect(),
            payment_method: method,
            notes: None,
            total_paid_cents: None,
            tax_cents: None,
            discount_cents: None,
        }
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(self.db.pool())
            .await
            .unwrap()
    }
}
