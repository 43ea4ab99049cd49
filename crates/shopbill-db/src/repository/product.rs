//! # Product Repository
//!
//! Catalog storage for one owner's products.
//!
//! ## Key Operations
//! - Creation with system-assigned product codes
//! - Filtered listing (search, category, unit, active flag, expiry window)
//! - Partial updates; codes never change once assigned
//! - Deletion, refused while any sale item references the product
//!
//! ## Code Allocation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create(owner, { product_code: None, ... })                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN ─► allocate(product_code) ─► "PRD-0007"                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT products ... ──► UNIQUE(product_code) failed?                  │
//! │       │                      │ yes: someone typed "PRD-0007" by hand   │
//! │       │                      └──► draw again (up to 5 attempts)        │
//! │       ▼ no                                                              │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock is written here only on create and explicit update. Sales debit it
//! through [`crate::repository::sale`].

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use shopbill_core::catalog::{ExpiryFilter, NewProduct, ProductUpdate, SequenceKind};
use shopbill_core::types::ProductView;
use shopbill_core::validation::validate_search_query;
use shopbill_core::Product;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::like_pattern;
use crate::repository::sequence::{self, MAX_ALLOCATION_ATTEMPTS};

/// Listing filters. All present filters must match.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Substring of name, product code or barcode.
    pub search: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub is_active: Option<bool>,
    pub expiry: Option<ExpiryFilter>,
}

/// A product with how many units of it have been sold.
#[derive(Debug, Clone, Serialize)]
pub struct ProductSalesSummary {
    #[serde(flatten)]
    pub product: ProductView,
    pub units_sold: i64,
}

#[derive(sqlx::FromRow)]
struct ProductWithUnits {
    #[sqlx(flatten)]
    product: Product,
    units_sold: i64,
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let product = repo.create(&owner_id, new_product).await?;
/// let soon = repo
///     .list(&owner_id, &ProductFilter { expiry: Some(ExpiryFilter::ExpiringSoon), ..Default::default() }, today)
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Creates a product, allocating a code when none is supplied.
    ///
    /// ## Returns
    /// * `Err(DbError::Validation)` - input rejected
    /// * `Err(DbError::UniqueViolation)` - the supplied code is taken, or
    ///   every allocation attempt collided
    pub async fn create(&self, owner_id: &str, mut input: NewProduct) -> DbResult<Product> {
        input.validate()?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let product = match input.product_code.clone() {
            Some(code) => {
                let product = input.into_product(id, owner_id.to_string(), code, now);
                insert(&mut tx, &product).await.map_err(|e| {
                    if e.is_unique_violation_on("product_code") {
                        DbError::duplicate("product_code", &product.product_code)
                    } else {
                        e
                    }
                })?;
                product
            }
            None => {
                let mut attempt = 1;
                loop {
                    let code = sequence::allocate(&mut tx, SequenceKind::ProductCode).await?;
                    let product =
                        input
                            .clone()
                            .into_product(id.clone(), owner_id.to_string(), code, now);

                    match insert(&mut tx, &product).await {
                        Ok(()) => break product,
                        Err(e)
                            if e.is_unique_violation_on("product_code")
                                && attempt < MAX_ALLOCATION_ATTEMPTS =>
                        {
                            warn!(code = %product.product_code, attempt, "Product code taken, drawing again");
                            attempt += 1;
                        }
                        Err(e) if e.is_unique_violation_on("product_code") => {
                            return Err(DbError::duplicate("product_code", &product.product_code));
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
        };

        tx.commit().await?;

        info!(id = %product.id, code = %product.product_code, "Product created");
        Ok(product)
    }

    /// Gets one of the owner's products.
    pub async fn get(&self, owner_id: &str, id: &str) -> DbResult<Product> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, owner_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Lists the owner's products, ordered by name.
    ///
    /// `today` drives the expiry filter and the derived view fields.
    pub async fn list(
        &self,
        owner_id: &str,
        filter: &ProductFilter,
        today: NaiveDate,
    ) -> DbResult<Vec<ProductView>> {
        let search = match &filter.search {
            Some(s) => Some(validate_search_query(s)?).filter(|s| !s.is_empty()),
            None => None,
        };
        let (expiry_from, expiry_to) = filter
            .expiry
            .map(|f| f.bounds(today))
            .unwrap_or((None, None));

        debug!(owner = %owner_id, ?filter, "Listing products");

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE owner_id = ?1
              AND (?2 IS NULL OR name LIKE ?2 OR product_code LIKE ?2 OR barcode LIKE ?2)
              AND (?3 IS NULL OR category = ?3)
              AND (?4 IS NULL OR unit = ?4)
              AND (?5 IS NULL OR is_active = ?5)
              AND (?6 IS NULL OR expiry_date >= ?6)
              AND (?7 IS NULL OR expiry_date <= ?7)
            ORDER BY name, product_code
            "#,
        )
        .bind(owner_id)
        .bind(search.as_deref().map(like_pattern))
        .bind(&filter.category)
        .bind(&filter.unit)
        .bind(filter.is_active)
        .bind(expiry_from)
        .bind(expiry_to)
        .fetch_all(&self.pool)
        .await?;

        Ok(products.into_iter().map(|p| p.into_view(today)).collect())
    }

    /// Applies a partial update.
    pub async fn update(&self, owner_id: &str, id: &str, update: ProductUpdate) -> DbResult<Product> {
        let now = Utc::now();
        let new_stock = update.stock_quantity;
        let mut tx = self.pool.begin().await?;

        // Take the write lock before reading; no sale debit lands in between.
        let touched = sqlx::query("UPDATE products SET updated_at = ?3 WHERE id = ?1 AND owner_id = ?2")
            .bind(id)
            .bind(owner_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        if touched.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        let mut product = fetch(&mut tx, owner_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;
        update.apply(&mut product, now)?;

        debug!(id = %id, stock_set = new_stock.is_some(), "Updating product");

        sqlx::query(
            r#"
            UPDATE products SET
                name = ?3,
                category = ?4,
                unit = ?5,
                purchase_price_cents = ?6,
                selling_price_cents = ?7,
                stock_quantity = COALESCE(?8, stock_quantity),
                min_stock_level = ?9,
                barcode = ?10,
                tax_rate_bps = ?11,
                discount_bps = ?12,
                expiry_date = ?13,
                manufacturer = ?14,
                supplier = ?15,
                description = ?16,
                is_active = ?17,
                updated_at = ?18
            WHERE id = ?1 AND owner_id = ?2
            "#,
        )
        .bind(&product.id)
        .bind(owner_id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.unit)
        .bind(product.purchase_price_cents)
        .bind(product.selling_price_cents)
        .bind(new_stock)
        .bind(product.min_stock_level)
        .bind(&product.barcode)
        .bind(product.tax_rate_bps)
        .bind(product.discount_bps)
        .bind(product.expiry_date)
        .bind(&product.manufacturer)
        .bind(&product.supplier)
        .bind(&product.description)
        .bind(product.is_active)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await?;

        let stored = fetch(&mut tx, owner_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;
        tx.commit().await?;

        Ok(stored)
    }

    /// Deletes a product that has never been sold.
    ///
    /// ## Returns
    /// * `Err(DbError::ForeignKeyViolation)` - sale items reference it
    pub async fn delete(&self, owner_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?1 AND owner_id = ?2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::ForeignKeyViolation { .. } => DbError::ForeignKeyViolation {
                    message: format!("product {} appears on existing sales", id),
                },
                other => other,
            })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(id = %id, "Product deleted");
        Ok(())
    }

    /// Every product of the owner with total units sold.
    pub async fn sales_summary(
        &self,
        owner_id: &str,
        today: NaiveDate,
    ) -> DbResult<Vec<ProductSalesSummary>> {
        let rows = sqlx::query_as::<_, ProductWithUnits>(
            r#"
            SELECT p.*,
                   COALESCE((SELECT SUM(si.quantity) FROM sale_items si WHERE si.product_id = p.id), 0)
                       AS units_sold
            FROM products p
            WHERE p.owner_id = ?1
            ORDER BY p.name, p.product_code
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| ProductSalesSummary {
                product: r.product.into_view(today),
                units_sold: r.units_sold,
            })
            .collect())
    }
}

/// Reads an owner's product on an existing connection or transaction.
pub(crate) async fn fetch(
    conn: &mut SqliteConnection,
    owner_id: &str,
    id: &str,
) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?1 AND owner_id = ?2")
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(product)
}

/// Debits stock by `quantity` in one relative statement.
///
/// No sufficiency check: stock may go negative.
pub(crate) async fn debit_stock(conn: &mut SqliteConnection, id: &str, quantity: i64) -> DbResult<()> {
    let result = sqlx::query(
        "UPDATE products SET stock_quantity = stock_quantity - ?2, updated_at = ?3 WHERE id = ?1",
    )
    .bind(id)
    .bind(quantity)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", id));
    }
    Ok(())
}

async fn insert(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
    debug!(code = %product.product_code, "Inserting product");

    sqlx::query(
        r#"
        INSERT INTO products (
            id, owner_id, product_code, name, category, unit,
            purchase_price_cents, selling_price_cents, stock_quantity, min_stock_level,
            barcode, tax_rate_bps, discount_bps, expiry_date,
            manufacturer, supplier, description, is_active,
            created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6,
            ?7, ?8, ?9, ?10,
            ?11, ?12, ?13, ?14,
            ?15, ?16, ?17, ?18,
            ?19, ?20
        )
        "#,
    )
    .bind(&product.id)
    .bind(&product.owner_id)
    .bind(&product.product_code)
    .bind(&product.name)
    .bind(&product.category)
    .bind(&product.unit)
    .bind(product.purchase_price_cents)
    .bind(product.selling_price_cents)
    .bind(product.stock_quantity)
    .bind(product.min_stock_level)
    .bind(&product.barcode)
    .bind(product.tax_rate_bps)
    .bind(product.discount_bps)
    .bind(product.expiry_date)
    .bind(&product.manufacturer)
    .bind(&product.supplier)
    .bind(&product.description)
    .bind(product.is_active)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
