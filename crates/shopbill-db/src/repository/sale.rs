//! # Sale Repository
//!
//! Invoicing: sales, their items, and the stock they consume.
//!
//! ## Sale Creation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       create(owner, NewSale)                            │
//! │                                                                         │
//! │  1. VALIDATE      items non-empty, 0 < quantity <= 1e6, discount >= 0  │
//! │     RESOLVE       every product exists for this owner (else NotFound)  │
//! │                                                                         │
//! │  2. BEGIN                                                              │
//! │     allocate(invoice_number) ──► "INV-00042"                           │
//! │     INSERT sales (totals = 0)                                          │
//! │                                                                         │
//! │  3. for each line:                                                     │
//! │       re-read product          (price, tax rate, name snapshots)       │
//! │       LineAmounts::compute     (taxable, tax, total)                   │
//! │       INSERT sale_items                                                │
//! │       UPDATE products SET stock_quantity = stock_quantity - qty        │
//! │                                                                         │
//! │  4. Σ items (checked) ──► taxable, tax; total = taxable + tax − disc   │
//! │     UPDATE sales                                                       │
//! │                                                                         │
//! │  5. COMMIT        any error before this drops the transaction:         │
//! │                   no sale, no items, no debits, no invoice number      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Totals sent by a client are never read; the header is always derived
//! from the persisted items.

use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use shopbill_core::catalog::SequenceKind;
use shopbill_core::invoice::{LineAmounts, NewSale, SaleTotals};
use shopbill_core::types::{InvoiceDocument, SaleItem, SaleWithItems};
use shopbill_core::validation::validate_search_query;
use shopbill_core::{CoreError, Money, Sale};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::sequence::{self, MAX_ALLOCATION_ATTEMPTS};
use crate::repository::{account, like_pattern, product};

/// Listing filters for sales.
#[derive(Debug, Clone, Default)]
pub struct SaleFilter {
    /// Substring of customer name or invoice number.
    pub search: Option<String>,
    /// First sale date included.
    pub from: Option<NaiveDate>,
    /// Last sale date included.
    pub to: Option<NaiveDate>,
    pub min_total_cents: Option<i64>,
    pub max_total_cents: Option<i64>,
    pub limit: Option<i64>,
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Creates a sale with its items in one transaction.
    ///
    /// ## Returns
    /// * `Err(DbError::Validation)` - malformed request
    /// * `Err(DbError::NotFound)` - a product does not exist for this owner
    pub async fn create(&self, owner_id: &str, input: NewSale) -> DbResult<SaleWithItems> {
        input.validate()?;

        // Resolve up front so a bad id fails before anything is written.
        {
            let mut conn = self.pool.acquire().await?;
            for line in &input.items {
                if product::fetch(&mut conn, owner_id, &line.product_id)
                    .await?
                    .is_none()
                {
                    return Err(CoreError::ProductNotFound(line.product_id.clone()).into());
                }
            }
        }

        let now = Utc::now();
        let mut sale = Sale {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            invoice_number: String::new(),
            sale_date: now,
            customer_name: input.customer_name,
            customer_phone: input.customer_phone,
            customer_address: input.customer_address,
            customer_gst: input.customer_gst,
            customer_state: input.customer_state,
            customer_state_code: input.customer_state_code,
            discount_cents: input.discount_cents,
            taxable_amount_cents: 0,
            tax_amount_cents: 0,
            total_amount_cents: 0,
            payment_method: input.payment_method,
            notes: input.notes,
            include_gst: input.include_gst,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.pool.begin().await?;

        let mut attempt = 1;
        loop {
            sale.invoice_number = sequence::allocate(&mut tx, SequenceKind::InvoiceNumber).await?;
            match insert_header(&mut tx, &sale).await {
                Ok(()) => break,
                Err(e)
                    if e.is_unique_violation_on("invoice_number")
                        && attempt < MAX_ALLOCATION_ATTEMPTS =>
                {
                    warn!(invoice = %sale.invoice_number, attempt, "Invoice number taken, drawing again");
                    attempt += 1;
                }
                Err(e) if e.is_unique_violation_on("invoice_number") => {
                    return Err(DbError::duplicate("invoice_number", &sale.invoice_number));
                }
                Err(e) => return Err(e),
            }
        }

        debug!(id = %sale.id, invoice = %sale.invoice_number, lines = input.items.len(), "Recording sale items");

        for line in &input.items {
            let product = product::fetch(&mut tx, owner_id, &line.product_id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

            let amounts = LineAmounts::compute(product.selling_price(), line.quantity, product.tax_rate())?;
            let item = SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale.id.clone(),
                product_id: product.id.clone(),
                quantity: line.quantity,
                product_name: product.name.clone(),
                sale_price_cents: product.selling_price_cents,
                tax_rate_bps: product.tax_rate_bps,
                taxable_amount_cents: amounts.taxable.cents(),
                tax_amount_cents: amounts.tax.cents(),
                total_amount_cents: amounts.total.cents(),
            };

            insert_item(&mut tx, &item).await?;
            product::debit_stock(&mut tx, &product.id, line.quantity).await?;
        }

        write_totals(&mut tx, &sale.id, Money::from_cents(sale.discount_cents)).await?;
        let created = load(&mut tx, owner_id, &sale.id).await?;
        tx.commit().await?;

        info!(
            id = %created.sale.id,
            invoice = %created.sale.invoice_number,
            total = %created.sale.total(),
            "Sale created"
        );
        Ok(created)
    }

    /// Gets a sale with its items.
    pub async fn get(&self, owner_id: &str, id: &str) -> DbResult<SaleWithItems> {
        let mut conn = self.pool.acquire().await?;
        load(&mut conn, owner_id, id).await
    }

    /// Lists the owner's sales, newest first.
    pub async fn list(&self, owner_id: &str, filter: &SaleFilter) -> DbResult<Vec<SaleWithItems>> {
        let search = match &filter.search {
            Some(s) => Some(validate_search_query(s)?).filter(|s| !s.is_empty()),
            None => None,
        };
        // Dates are inclusive; compare timestamps against [from 00:00, to+1 00:00).
        let from = filter.from.map(|d| d.and_time(NaiveTime::MIN).and_utc());
        let until = filter
            .to
            .and_then(|d| d.checked_add_signed(Duration::days(1)))
            .map(|d| d.and_time(NaiveTime::MIN).and_utc());

        debug!(owner = %owner_id, ?filter, "Listing sales");

        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT * FROM sales
            WHERE owner_id = ?1
              AND (?2 IS NULL OR customer_name LIKE ?2 OR invoice_number LIKE ?2)
              AND (?3 IS NULL OR sale_date >= ?3)
              AND (?4 IS NULL OR sale_date < ?4)
              AND (?5 IS NULL OR total_amount_cents >= ?5)
              AND (?6 IS NULL OR total_amount_cents <= ?6)
            ORDER BY sale_date DESC, invoice_number DESC
            LIMIT ?7
            "#,
        )
        .bind(owner_id)
        .bind(search.as_deref().map(like_pattern))
        .bind(from)
        .bind(until)
        .bind(filter.min_total_cents)
        .bind(filter.max_total_cents)
        .bind(filter.limit.unwrap_or(-1))
        .fetch_all(&self.pool)
        .await?;

        let mut conn = self.pool.acquire().await?;
        let mut result = Vec::with_capacity(sales.len());
        for sale in sales {
            let items = fetch_items(&mut conn, &sale.id).await?;
            result.push(SaleWithItems { sale, items });
        }
        Ok(result)
    }

    /// Recomputes the header from the stored items.
    ///
    /// Running it twice stores the same values.
    pub async fn recompute_totals(&self, owner_id: &str, id: &str) -> DbResult<SaleWithItems> {
        let mut tx = self.pool.begin().await?;

        let discount: Option<i64> =
            sqlx::query_scalar("SELECT discount_cents FROM sales WHERE id = ?1 AND owner_id = ?2")
                .bind(id)
                .bind(owner_id)
                .fetch_optional(&mut *tx)
                .await?;
        let discount = discount.ok_or_else(|| DbError::not_found("Sale", id))?;

        write_totals(&mut tx, id, Money::from_cents(discount)).await?;
        let sale = load(&mut tx, owner_id, id).await?;
        tx.commit().await?;
        Ok(sale)
    }

    /// Deletes a sale and, by cascade, its items.
    ///
    /// Stock is not restored.
    pub async fn delete(&self, owner_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM sales WHERE id = ?1 AND owner_id = ?2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", id));
        }

        info!(id = %id, "Sale deleted");
        Ok(())
    }

    /// The sale plus the seller block, for an external invoice renderer.
    pub async fn document(&self, owner_id: &str, id: &str) -> DbResult<InvoiceDocument> {
        let mut conn = self.pool.acquire().await?;
        let sale = load(&mut conn, owner_id, id).await?;
        let profile = account::load_profile(&mut conn, owner_id).await?;

        Ok(InvoiceDocument {
            sale,
            shop: profile.into(),
        })
    }
}

async fn insert_header(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sales (
            id, owner_id, invoice_number, sale_date,
            customer_name, customer_phone, customer_address,
            customer_gst, customer_state, customer_state_code,
            discount_cents, taxable_amount_cents, tax_amount_cents, total_amount_cents,
            payment_method, notes, include_gst, created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4,
            ?5, ?6, ?7,
            ?8, ?9, ?10,
            ?11, ?12, ?13, ?14,
            ?15, ?16, ?17, ?18, ?19
        )
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.owner_id)
    .bind(&sale.invoice_number)
    .bind(sale.sale_date)
    .bind(&sale.customer_name)
    .bind(&sale.customer_phone)
    .bind(&sale.customer_address)
    .bind(&sale.customer_gst)
    .bind(&sale.customer_state)
    .bind(&sale.customer_state_code)
    .bind(sale.discount_cents)
    .bind(sale.taxable_amount_cents)
    .bind(sale.tax_amount_cents)
    .bind(sale.total_amount_cents)
    .bind(sale.payment_method)
    .bind(&sale.notes)
    .bind(sale.include_gst)
    .bind(sale.created_at)
    .bind(sale.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn insert_item(conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sale_items (
            id, sale_id, product_id, quantity,
            product_name, sale_price_cents, tax_rate_bps,
            taxable_amount_cents, tax_amount_cents, total_amount_cents
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&item.id)
    .bind(&item.sale_id)
    .bind(&item.product_id)
    .bind(item.quantity)
    .bind(&item.product_name)
    .bind(item.sale_price_cents)
    .bind(item.tax_rate_bps)
    .bind(item.taxable_amount_cents)
    .bind(item.tax_amount_cents)
    .bind(item.total_amount_cents)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Sums the items of a sale and stores the header aggregates.
async fn write_totals(conn: &mut SqliteConnection, sale_id: &str, discount: Money) -> DbResult<SaleTotals> {
    let lines: Vec<(i64, i64)> = sqlx::query_as(
        "SELECT taxable_amount_cents, tax_amount_cents FROM sale_items WHERE sale_id = ?1",
    )
    .bind(sale_id)
    .fetch_all(&mut *conn)
    .await?;

    let totals = SaleTotals::from_amounts(
        lines
            .into_iter()
            .map(|(taxable, tax)| (Money::from_cents(taxable), Money::from_cents(tax))),
        discount,
    )?;

    sqlx::query(
        r#"
        UPDATE sales SET
            taxable_amount_cents = ?2,
            tax_amount_cents = ?3,
            total_amount_cents = ?4,
            updated_at = ?5
        WHERE id = ?1
        "#,
    )
    .bind(sale_id)
    .bind(totals.taxable.cents())
    .bind(totals.tax.cents())
    .bind(totals.total.cents())
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(totals)
}

async fn fetch_items(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Vec<SaleItem>> {
    let items = sqlx::query_as::<_, SaleItem>("SELECT * FROM sale_items WHERE sale_id = ?1 ORDER BY rowid")
        .bind(sale_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(items)
}

async fn load(conn: &mut SqliteConnection, owner_id: &str, id: &str) -> DbResult<SaleWithItems> {
    let sale = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = ?1 AND owner_id = ?2")
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::from(CoreError::SaleNotFound(id.to_string())))?;

    let items = fetch_items(conn, id).await?;
    Ok(SaleWithItems { sale, items })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Database;
    use crate::repository::testing;
    use shopbill_core::catalog::NewProduct;
    use shopbill_core::invoice::NewSaleLine;
    use shopbill_core::Product;

    async fn product(db: &Database, owner: &str, name: &str, price: i64, bps: u32, stock: i64) -> Product {
        let input = NewProduct {
            name: name.to_string(),
            purchase_price_cents: price / 2,
            selling_price_cents: price,
            stock_quantity: stock,
            tax_rate_bps: bps,
            is_active: true,
            ..NewProduct::default()
        };
        db.products().create(owner, input).await.unwrap()
    }

    fn sale(lines: &[(&str, i64)], discount_cents: i64) -> NewSale {
        NewSale {
            customer_name: Some("Asha Verma".to_string()),
            discount_cents,
            include_gst: true,
            items: lines
                .iter()
                .map(|(id, q)| NewSaleLine {
                    product_id: id.to_string(),
                    quantity: *q,
                })
                .collect(),
            ..NewSale::default()
        }
    }

    async fn stock(db: &Database, owner: &str, id: &str) -> i64 {
        db.products().get(owner, id).await.unwrap().stock_quantity
    }

    async fn count(db: &Database, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_three_at_eighteen_percent() {
        let db = testing::database().await;
        let owner = testing::owner(&db, "owner@shop.in").await;
        let rice = product(&db, &owner, "Rice", 10000, 1800, 10).await;

        let created = db.sales().create(&owner, sale(&[(rice.id.as_str(), 3)], 0)).await.unwrap();

        assert_eq!(created.sale.invoice_number, "INV-00001");
        assert_eq!(created.items.len(), 1);
        let item = &created.items[0];
        assert_eq!(item.taxable_amount_cents, 30000);
        assert_eq!(item.tax_amount_cents, 5400);
        assert_eq!(item.total_amount_cents, 35400);
        assert_eq!(item.product_name, "Rice");
        assert_eq!(created.sale.total_amount_cents, 35400);
        assert_eq!(created.sale.total().to_string(), "354.00");
        assert_eq!(stock(&db, &owner, &rice.id).await, 7);
    }

    #[tokio::test]
    async fn test_header_is_sum_of_items_minus_discount() {
        let db = testing::database().await;
        let owner = testing::owner(&db, "owner@shop.in").await;
        let a = product(&db, &owner, "Soap", 2500, 1800, 50).await;
        let b = product(&db, &owner, "Pen", 1000, 500, 50).await;

        let created = db
            .sales()
            .create(&owner, sale(&[(a.id.as_str(), 2), (b.id.as_str(), 3)], 700))
            .await
            .unwrap();

        let taxable: i64 = created.items.iter().map(|i| i.taxable_amount_cents).sum();
        let tax: i64 = created.items.iter().map(|i| i.tax_amount_cents).sum();
        let s = &created.sale;
        assert_eq!(s.taxable_amount_cents, taxable);
        assert_eq!(s.tax_amount_cents, tax);
        assert_eq!(s.total_amount_cents, s.taxable_amount_cents + s.tax_amount_cents - s.discount_cents);
        for item in &created.items {
            assert_eq!(LineAmounts::of_item(item).unwrap().total.cents(), item.total_amount_cents);
        }
    }

    #[tokio::test]
    async fn test_snapshots_survive_product_changes() {
        let db = testing::database().await;
        let owner = testing::owner(&db, "owner@shop.in").await;
        let rice = product(&db, &owner, "Rice", 10000, 1800, 10).await;
        let created = db.sales().create(&owner, sale(&[(rice.id.as_str(), 1)], 0)).await.unwrap();

        let update = shopbill_core::catalog::ProductUpdate {
            selling_price_cents: Some(99900),
            name: Some("Premium Rice".to_string()),
            ..Default::default()
        };
        db.products().update(&owner, &rice.id, update).await.unwrap();

        let again = db.sales().recompute_totals(&owner, &created.sale.id).await.unwrap();
        assert_eq!(again.items[0].sale_price_cents, 10000);
        assert_eq!(again.items[0].product_name, "Rice");
        assert_eq!(again.sale.total_amount_cents, created.sale.total_amount_cents);
    }

    #[tokio::test]
    async fn test_recompute_is_idempotent() {
        let db = testing::database().await;
        let owner = testing::owner(&db, "owner@shop.in").await;
        let rice = product(&db, &owner, "Rice", 333, 1250, 10).await;
        let created = db.sales().create(&owner, sale(&[(rice.id.as_str(), 7)], 50)).await.unwrap();

        let once = db.sales().recompute_totals(&owner, &created.sale.id).await.unwrap();
        let twice = db.sales().recompute_totals(&owner, &created.sale.id).await.unwrap();

        assert_eq!(once.sale.total_amount_cents, created.sale.total_amount_cents);
        assert_eq!(twice.sale.total_amount_cents, once.sale.total_amount_cents);
        assert_eq!(twice.sale.tax_amount_cents, once.sale.tax_amount_cents);
    }

    #[tokio::test]
    async fn test_oversell_drives_stock_negative() {
        let db = testing::database().await;
        let owner = testing::owner(&db, "owner@shop.in").await;
        let rice = product(&db, &owner, "Rice", 10000, 0, 2).await;

        db.sales().create(&owner, sale(&[(rice.id.as_str(), 5)], 0)).await.unwrap();
        assert_eq!(stock(&db, &owner, &rice.id).await, -3);
    }

    #[tokio::test]
    async fn test_huge_quantity_is_rejected() {
        let db = testing::database().await;
        let owner = testing::owner(&db, "owner@shop.in").await;
        let rice = product(&db, &owner, "Rice", 10000, 0, 10).await;

        let err = db
            .sales()
            .create(&owner, sale(&[(rice.id.as_str(), i64::MAX / 1000)], 0))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Validation(_)));
        assert_eq!(count(&db, "sales").await, 0);
        assert_eq!(stock(&db, &owner, &rice.id).await, 10);
    }

    #[tokio::test]
    async fn test_line_amount_overflow_rolls_back() {
        let db = testing::database().await;
        let owner = testing::owner(&db, "owner@shop.in").await;
        let gold = product(&db, &owner, "Gold Bar", i64::MAX / 2, 300, 10).await;

        let err = db
            .sales()
            .create(&owner, sale(&[(gold.id.as_str(), 3)], 0))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Validation(_)));
        assert_eq!(count(&db, "sales").await, 0);
        assert_eq!(count(&db, "sale_items").await, 0);
        assert_eq!(stock(&db, &owner, &gold.id).await, 10);

        let rice = product(&db, &owner, "Rice", 10000, 0, 10).await;
        let created = db.sales().create(&owner, sale(&[(rice.id.as_str(), 1)], 0)).await.unwrap();
        assert_eq!(created.sale.invoice_number, "INV-00001");
    }

    #[tokio::test]
    async fn test_unknown_product_writes_nothing() {
        let db = testing::database().await;
        let owner = testing::owner(&db, "owner@shop.in").await;
        let rice = product(&db, &owner, "Rice", 10000, 0, 10).await;

        let err = db
            .sales()
            .create(&owner, sale(&[(rice.id.as_str(), 1), ("missing", 1)], 0))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::NotFound { .. }));
        assert_eq!(count(&db, "sales").await, 0);
        assert_eq!(stock(&db, &owner, &rice.id).await, 10);
    }

    #[tokio::test]
    async fn test_other_owners_product_is_not_found() {
        let db = testing::database().await;
        let owner = testing::owner(&db, "owner@shop.in").await;
        let other = testing::owner(&db, "other@shop.in").await;
        let theirs = product(&db, &other, "Rice", 10000, 0, 10).await;

        let err = db.sales().create(&owner, sale(&[(theirs.id.as_str(), 1)], 0)).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_failure_mid_sale_rolls_everything_back() {
        let db = testing::database().await;
        let owner = testing::owner(&db, "owner@shop.in").await;
        let first = product(&db, &owner, "Rice", 10000, 1800, 10).await;
        let second = product(&db, &owner, "Dal", 5000, 500, 10).await;

        // Fail the second item's insert after the first item has been
        // written and its stock debited.
        sqlx::query(&format!(
            "CREATE TRIGGER reject_item BEFORE INSERT ON sale_items \
             WHEN NEW.product_id = '{}' BEGIN SELECT RAISE(ABORT, 'rejected'); END",
            second.id
        ))
        .execute(db.pool())
        .await
        .unwrap();

        let result = db
            .sales()
            .create(&owner, sale(&[(first.id.as_str(), 2), (second.id.as_str(), 1)], 0))
            .await;
        assert!(result.is_err());

        assert_eq!(count(&db, "sales").await, 0);
        assert_eq!(count(&db, "sale_items").await, 0);
        assert_eq!(stock(&db, &owner, &first.id).await, 10);
        assert_eq!(stock(&db, &owner, &second.id).await, 10);

        sqlx::query("DROP TRIGGER reject_item").execute(db.pool()).await.unwrap();
        let created = db.sales().create(&owner, sale(&[(first.id.as_str(), 1)], 0)).await.unwrap();
        assert_eq!(created.sale.invoice_number, "INV-00001");
    }

    #[tokio::test]
    async fn test_sold_product_cannot_be_deleted_until_sale_is() {
        let db = testing::database().await;
        let owner = testing::owner(&db, "owner@shop.in").await;
        let rice = product(&db, &owner, "Rice", 10000, 0, 10).await;
        let created = db.sales().create(&owner, sale(&[(rice.id.as_str(), 1)], 0)).await.unwrap();

        let err = db.products().delete(&owner, &rice.id).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));

        db.sales().delete(&owner, &created.sale.id).await.unwrap();
        assert_eq!(count(&db, "sale_items").await, 0);
        db.products().delete(&owner, &rice.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_filters_and_limit() {
        let db = testing::database().await;
        let owner = testing::owner(&db, "owner@shop.in").await;
        let rice = product(&db, &owner, "Rice", 10000, 0, 100).await;

        for qty in 1..=3 {
            db.sales().create(&owner, sale(&[(rice.id.as_str(), qty)], 0)).await.unwrap();
        }

        let all = db.sales().list(&owner, &SaleFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].sale.invoice_number, "INV-00003");
        assert_eq!(all[0].items.len(), 1);

        let by_number = SaleFilter {
            search: Some("00002".to_string()),
            ..Default::default()
        };
        let found = db.sales().list(&owner, &by_number).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].sale.total_amount_cents, 20000);

        let by_total = SaleFilter {
            min_total_cents: Some(15000),
            max_total_cents: Some(30000),
            ..Default::default()
        };
        assert_eq!(db.sales().list(&owner, &by_total).await.unwrap().len(), 2);

        let limited = SaleFilter {
            limit: Some(1),
            ..Default::default()
        };
        assert_eq!(db.sales().list(&owner, &limited).await.unwrap().len(), 1);

        let today = Utc::now().date_naive();
        let today_only = SaleFilter {
            from: Some(today),
            to: Some(today),
            ..Default::default()
        };
        assert_eq!(db.sales().list(&owner, &today_only).await.unwrap().len(), 3);

        let yesterday = SaleFilter {
            to: today.pred_opt(),
            ..Default::default()
        };
        assert!(db.sales().list(&owner, &yesterday).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_document_carries_shop_profile() {
        let db = testing::database().await;
        let owner = testing::owner(&db, "owner@shop.in").await;
        let rice = product(&db, &owner, "Rice", 10000, 1800, 10).await;
        let created = db.sales().create(&owner, sale(&[(rice.id.as_str(), 1)], 0)).await.unwrap();

        let doc = db.sales().document(&owner, &created.sale.id).await.unwrap();
        assert_eq!(doc.shop.shop_name, "Sharma Stores");
        assert_eq!(doc.sale.sale.id, created.sale.id);
    }
}
