//! # Seed Data Generator
//!
//! Creates the standard subscription plans and, optionally, a demo catalog
//! for an existing account.
//!
//! ## Usage
//! ```bash
//! # Plans only
//! cargo run -p shopbill-db --bin seed
//!
//! # Plans plus a demo catalog for a registered owner
//! cargo run -p shopbill-db --bin seed -- --owner owner@shop.in
//!
//! # Grant admin rights to a registered account
//! cargo run -p shopbill-db --bin seed -- --admin admin@shop.in
//!
//! # Specify database path
//! cargo run -p shopbill-db --bin seed -- --db ./data/shopbill.db
//! ```

use std::env;

use chrono::Utc;
use shopbill_core::catalog::NewProduct;
use shopbill_core::subscription::NewPlan;
use shopbill_db::{Database, DbConfig, ProductFilter};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// (name, price in paise, duration in minutes)
const PLANS: &[(&str, i64, i64)] = &[
    ("Trial", 0, 7 * 24 * 60),
    ("Monthly", 49_900, 30 * 24 * 60),
    ("Quarterly", 134_900, 90 * 24 * 60),
    ("Yearly", 499_900, 365 * 24 * 60),
];

/// (name, category, unit, purchase, selling, stock, min stock, GST bps)
const CATALOG: &[(&str, &str, &str, i64, i64, i64, i64, u32)] = &[
    ("Basmati Rice 5kg", "Grocery", "bag", 52_000, 64_900, 40, 5, 500),
    ("Toor Dal 1kg", "Grocery", "pkt", 11_000, 14_500, 60, 10, 500),
    ("Sunflower Oil 1L", "Grocery", "btl", 12_500, 15_900, 35, 8, 500),
    ("Atta 10kg", "Grocery", "bag", 34_000, 41_000, 25, 5, 0),
    ("Masala Chai 250g", "Beverages", "pkt", 9_500, 13_000, 50, 10, 500),
    ("Instant Coffee 100g", "Beverages", "jar", 21_000, 27_500, 20, 5, 1800),
    ("Bath Soap 4-pack", "Personal Care", "pack", 11_500, 15_600, 30, 6, 1800),
    ("Toothpaste 150g", "Personal Care", "pcs", 7_800, 10_500, 45, 10, 1800),
    ("Detergent 1kg", "Household", "pkt", 9_000, 12_400, 28, 6, 1800),
    ("LED Bulb 9W", "Electrical", "pcs", 6_500, 9_900, 3, 5, 1200),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut db_path = env::var("DATABASE_PATH").unwrap_or_else(|_| "./shopbill_dev.db".to_string());
    let mut owner_email: Option<String> = None;
    let mut admin_email: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if let Some(path) = args.get(i + 1) {
                    db_path = path.clone();
                    i += 1;
                }
            }
            "--owner" | "-o" => {
                if let Some(email) = args.get(i + 1) {
                    owner_email = Some(email.clone());
                    i += 1;
                }
            }
            "--admin" | "-a" => {
                if let Some(email) = args.get(i + 1) {
                    admin_email = Some(email.clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Shopbill Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>       Database file path (default: ./shopbill_dev.db)");
                println!("  -o, --owner <EMAIL>   Also create a demo catalog for this account");
                println!("  -a, --admin <EMAIL>   Grant admin rights to this account");
                println!("  -h, --help            Show this help message");
                return Ok(());
            }
            other => warn!(arg = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    let db = Database::new(DbConfig::new(&db_path)).await?;
    info!(path = %db_path, "Connected, migrations applied");

    let existing = db.subscriptions().list_plans().await?;
    if existing.is_empty() {
        for (name, price_cents, duration_minutes) in PLANS {
            let plan = db
                .subscriptions()
                .create_plan(NewPlan {
                    name: name.to_string(),
                    price_cents: *price_cents,
                    duration_minutes: *duration_minutes,
                })
                .await?;
            info!(plan = %plan.name, id = %plan.id, "Created plan");
        }
    } else {
        info!(count = existing.len(), "Plans already present, skipping");
    }

    if let Some(email) = admin_email {
        match db.accounts().credentials(&email).await? {
            Some((account, _)) => {
                db.accounts().set_admin(&account.id, true).await?;
                info!(user = %account.id, "Granted admin rights");
            }
            None => warn!(email = %email, "No account with that email; register it first"),
        }
    }

    let Some(email) = owner_email else {
        info!("Seed complete");
        return Ok(());
    };

    let Some((owner, _)) = db.accounts().credentials(&email).await? else {
        warn!(email = %email, "No account with that email; register it first");
        return Ok(());
    };

    let today = Utc::now().date_naive();
    let products = db
        .products()
        .list(&owner.id, &ProductFilter::default(), today)
        .await?;
    if !products.is_empty() {
        info!(count = products.len(), "Owner already has products, skipping catalog");
        return Ok(());
    }

    for (name, category, unit, purchase, selling, stock, min_stock, tax_bps) in CATALOG {
        let input = NewProduct {
            name: name.to_string(),
            category: Some(category.to_string()),
            unit: Some(unit.to_string()),
            purchase_price_cents: *purchase,
            selling_price_cents: *selling,
            stock_quantity: *stock,
            min_stock_level: *min_stock,
            tax_rate_bps: *tax_bps,
            is_active: true,
            ..NewProduct::default()
        };
        match db.products().create(&owner.id, input).await {
            Ok(product) => info!(code = %product.product_code, name = %product.name, "Created product"),
            Err(e) => warn!(name = %name, error = %e, "Failed to create product"),
        }
    }

    info!("Seed complete");
    Ok(())
}
