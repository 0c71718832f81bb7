//! # Seed Data Generator
//!
//! Provisions a demo store so the order flow can be exercised locally.
//!
//! ## Usage
//! ```bash
//! # Seed the database named by KASIR_DB_PATH (default ./kasir.db)
//! cargo run -p kasir-db --bin seed
//!
//! # Specify database path and opening float
//! cargo run -p kasir-db --bin seed -- --db ./data/kasir.db --float 50000
//! ```
//!
//! ## What Gets Created
//! - One outlet with an open cash register
//! - One operator with an open shift
//! - A handful of products, each stocked at the outlet
//! - One demo cash sale, so the ledgers have something in them

use std::env;
use std::error::Error;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use kasir_core::{CheckoutItem, CheckoutRequest, Money, PaymentMethod};
use kasir_db::{Database, PosConfig};

/// (sku, name, unit price in cents, opening stock)
const PRODUCTS: &[(&str, &str, i64, i64)] = &[
    ("KOP-001", "Kopi Susu", 1_800, 120),
    ("KOP-002", "Es Kopi Aren", 2_200, 80),
    ("TEH-001", "Teh Tarik", 1_500, 60),
    ("ROT-001", "Roti Bakar Coklat", 2_000, 40),
    ("MIE-001", "Mie Goreng", 2_500, 35),
    ("AIR-001", "Air Mineral 600ml", 500, 200),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let mut config = PosConfig::load()?;
    let mut opening_float = Money::from_cents(100_000);

    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.database_path = args[i + 1].clone().into();
                    i += 1;
                }
            }
            "--float" | "-f" => {
                if i + 1 < args.len() {
                    opening_float = Money::from_cents(args[i + 1].parse()?);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Kasir POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>      Database file path (default: $KASIR_DB_PATH or ./kasir.db)");
                println!("  -f, --float <CENTS>  Opening register balance in cents (default: 100000)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            other => warn!(argument = other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    info!(path = %config.database_path.display(), "Seeding database");

    let db = Database::new(config.db_config()).await?;
    let catalog = db.catalog();

    let existing = catalog.count_products().await?;
    if existing > 0 {
        warn!(existing, "Database already has products, skipping seed");
        warn!("Delete the database file to regenerate");
        return Ok(());
    }

    let outlet_id = catalog.insert_outlet("Kasir Demo Outlet").await?;
    let user_id = catalog.insert_user("Demo Cashier").await?;
    let shift_id = catalog.open_shift(&outlet_id, &user_id).await?;
    db.cash_registers().open(&outlet_id, opening_float).await?;

    let mut items = Vec::new();
    for (sku, name, price_cents, stock) in PRODUCTS {
        let product_id = catalog.insert_product(sku, name).await?;
        db.inventory().create(&outlet_id, &product_id, *stock).await?;

        if items.len() < 2 {
            items.push(CheckoutItem {
                product_id,
                quantity: 1,
                price_cents: *price_cents,
            });
        }
    }

    info!(
        outlet_id = %outlet_id,
        user_id = %user_id,
        shift_id = %shift_id,
        products = PRODUCTS.len(),
        "Store provisioned"
    );

    let pos = db.coordinator(config.ledger_policy(), config.payment_methods.clone());
    let request = CheckoutRequest {
        outlet_id: outlet_id.clone(),
        shift_id,
        items,
        payment_method: PaymentMethod::Cash,
        notes: Some("Seeded demo sale".to_string()),
        total_paid_cents: Some(5_000),
        tax_cents: None,
        discount_cents: None,
    };
    let detail = pos.create_order(&request, &user_id).await?;

    let balance = db.cash_account().balance(&outlet_id).await?;
    info!(
        order_number = %detail.order.order_number,
        total = %detail.order.total(),
        change = %detail.order.change(),
        balance = %balance,
        "Demo sale recorded"
    );

    db.close().await;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kasir=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
