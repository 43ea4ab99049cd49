//! # Customer Repository
//!
//! The owner's customer directory. Listed newest first.

use chrono::Utc;
use shopbill_core::directory::{Customer, CustomerInput, CustomerType, RecordStatus};
use shopbill_core::validation::validate_search_query;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::like_pattern;

/// Listing filters for customers.
#[derive(Debug, Clone, Default)]
pub struct CustomerFilter {
    /// Substring of name, phone, email or city.
    pub search: Option<String>,
    pub customer_type: Option<CustomerType>,
    pub status: Option<RecordStatus>,
    pub country: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    pub async fn create(&self, owner_id: &str, mut input: CustomerInput) -> DbResult<Customer> {
        input.validate()?;
        let now = Utc::now();

        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            name: input.name,
            phone: input.phone,
            email: input.email,
            address: input.address,
            city: input.city,
            state: input.state,
            zip: input.zip,
            country: input.country,
            customer_type: input.customer_type,
            tax_id: input.tax_id,
            notes: input.notes,
            status: input.status,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, owner_id, name, phone, email, address, city, state, zip, country,
                customer_type, tax_id, notes, status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.owner_id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(&customer.address)
        .bind(&customer.city)
        .bind(&customer.state)
        .bind(&customer.zip)
        .bind(&customer.country)
        .bind(customer.customer_type)
        .bind(&customer.tax_id)
        .bind(&customer.notes)
        .bind(customer.status)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        debug!(id = %customer.id, "Customer created");
        Ok(customer)
    }

    pub async fn get(&self, owner_id: &str, id: &str) -> DbResult<Customer> {
        sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = ?1 AND owner_id = ?2")
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    pub async fn list(&self, owner_id: &str, filter: &CustomerFilter) -> DbResult<Vec<Customer>> {
        let search = match &filter.search {
            Some(s) => Some(validate_search_query(s)?).filter(|s| !s.is_empty()),
            None => None,
        };

        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT * FROM customers
            WHERE owner_id = ?1
              AND (?2 IS NULL OR name LIKE ?2 OR phone LIKE ?2 OR email LIKE ?2 OR city LIKE ?2)
              AND (?3 IS NULL OR customer_type = ?3)
              AND (?4 IS NULL OR status = ?4)
              AND (?5 IS NULL OR country = ?5)
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .bind(search.as_deref().map(like_pattern))
        .bind(filter.customer_type)
        .bind(filter.status)
        .bind(&filter.country)
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Replaces every editable field.
    pub async fn update(&self, owner_id: &str, id: &str, mut input: CustomerInput) -> DbResult<Customer> {
        input.validate()?;

        let result = sqlx::query(
            r#"
            UPDATE customers SET
                name = ?3, phone = ?4, email = ?5, address = ?6, city = ?7,
                state = ?8, zip = ?9, country = ?10, customer_type = ?11,
                tax_id = ?12, notes = ?13, status = ?14, updated_at = ?15
            WHERE id = ?1 AND owner_id = ?2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(&input.name)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.address)
        .bind(&input.city)
        .bind(&input.state)
        .bind(&input.zip)
        .bind(&input.country)
        .bind(input.customer_type)
        .bind(&input.tax_id)
        .bind(&input.notes)
        .bind(input.status)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }
        self.get(owner_id, id).await
    }

    pub async fn delete(&self, owner_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM customers WHERE id = ?1 AND owner_id = ?2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }
        Ok(())
    }

    /// Sets the status; `reason` is only logged.
    pub async fn set_status(
        &self,
        owner_id: &str,
        id: &str,
        status: RecordStatus,
        reason: Option<&str>,
    ) -> DbResult<Customer> {
        let result = sqlx::query(
            "UPDATE customers SET status = ?3, updated_at = ?4 WHERE id = ?1 AND owner_id = ?2",
        )
        .bind(id)
        .bind(owner_id)
        .bind(status)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        info!(id = %id, ?status, reason = reason.unwrap_or(""), "Customer status changed");
        self.get(owner_id, id).await
    }
}
