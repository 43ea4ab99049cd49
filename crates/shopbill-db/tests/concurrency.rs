//! Concurrent writers against a file-backed database.
//!
//! In-memory pools hold a single connection, so these run on a temporary
//! file with several pooled connections to get real contention.

use std::collections::HashSet;
use std::time::Duration;

use shopbill_core::account::Registration;
use shopbill_core::catalog::{NewProduct, ProductUpdate};
use shopbill_core::invoice::{NewSale, NewSaleLine};
use shopbill_db::{Database, DbConfig};
use tempfile::TempDir;

async fn file_database() -> (TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let config = DbConfig::new(dir.path().join("shopbill.db")).max_connections(4);
    let db = Database::new(config).await.unwrap();
    (dir, db)
}

async fn owner(db: &Database) -> String {
    let registration = Registration {
        email: "owner@shop.in".to_string(),
        username: "owner".to_string(),
        password: "s3cretpass".to_string(),
        confirm_password: "s3cretpass".to_string(),
        shop_name: "Sharma Stores".to_string(),
        phone: "9800000000".to_string(),
        gst_number: None,
        address: None,
        referred_by: None,
    };
    db.accounts()
        .create(registration, "not-a-real-hash")
        .await
        .unwrap()
        .id
}

fn product(name: &str, stock: i64) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        purchase_price_cents: 8000,
        selling_price_cents: 10000,
        stock_quantity: stock,
        tax_rate_bps: 1800,
        is_active: true,
        ..NewProduct::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_product_creates_get_distinct_codes() {
    let (_dir, db) = file_database().await;
    let owner_id = owner(&db).await;

    let mut handles = Vec::new();
    for i in 0..8 {
        let repo = db.products();
        let owner_id = owner_id.clone();
        handles.push(tokio::spawn(async move {
            repo.create(&owner_id, product(&format!("Item {i}"), 10)).await
        }));
    }

    let mut codes = HashSet::new();
    for handle in handles {
        let created = handle.await.unwrap().unwrap();
        assert!(codes.insert(created.product_code));
    }

    let expected: HashSet<String> = (1..=8).map(|n| format!("PRD-{n:04}")).collect();
    assert_eq!(codes, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sales_lose_no_stock_updates() {
    let (_dir, db) = file_database().await;
    let owner_id = owner(&db).await;
    let rice = db.products().create(&owner_id, product("Rice", 100)).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..10 {
        let repo = db.sales();
        let owner_id = owner_id.clone();
        let product_id = rice.id.clone();
        handles.push(tokio::spawn(async move {
            let sale = NewSale {
                items: vec![NewSaleLine {
                    product_id,
                    quantity: 2,
                }],
                include_gst: true,
                ..NewSale::default()
            };
            repo.create(&owner_id, sale).await
        }));
    }

    let mut invoices = HashSet::new();
    for handle in handles {
        let sale = handle.await.unwrap().unwrap();
        assert_eq!(sale.sale.total_amount_cents, 23600);
        assert!(invoices.insert(sale.sale.invoice_number));
    }
    assert_eq!(invoices.len(), 10);
    assert!(invoices.contains("INV-00001"));
    assert!(invoices.contains("INV-00010"));

    let reloaded = db.products().get(&owner_id, &rice.id).await.unwrap();
    assert_eq!(reloaded.stock_quantity, 80);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn rename_during_open_sale_keeps_the_debit() {
    let (_dir, db) = file_database().await;
    let owner_id = owner(&db).await;
    let rice = db.products().create(&owner_id, product("Rice", 10)).await.unwrap();

    // A sale's stock debit, written but not yet committed.
    let mut sale_tx = db.pool().begin().await.unwrap();
    sqlx::query("UPDATE products SET stock_quantity = stock_quantity - 3 WHERE id = ?1")
        .bind(&rice.id)
        .execute(&mut *sale_tx)
        .await
        .unwrap();

    let repo = db.products();
    let (owner, id) = (owner_id.clone(), rice.id.clone());
    let rename = tokio::spawn(async move {
        let update = ProductUpdate {
            name: Some("Premium Rice".to_string()),
            ..ProductUpdate::default()
        };
        repo.update(&owner, &id, update).await
    });

    tokio::time::sleep(Duration::from_millis(200)).await;
    sale_tx.commit().await.unwrap();

    let renamed = rename.await.unwrap().unwrap();
    assert_eq!(renamed.name, "Premium Rice");
    assert_eq!(renamed.stock_quantity, 7);

    let reloaded = db.products().get(&owner_id, &rice.id).await.unwrap();
    assert_eq!(reloaded.stock_quantity, 7);
}
