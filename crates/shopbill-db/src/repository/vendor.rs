//! # Vendor Repository
//!
//! Suppliers, manufacturers and distributors the owner buys from.

use chrono::Utc;
use shopbill_core::directory::{RecordStatus, Vendor, VendorInput, VendorType};
use shopbill_core::validation::validate_search_query;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::like_pattern;

/// Listing filters for vendors.
#[derive(Debug, Clone, Default)]
pub struct VendorFilter {
    /// Substring of name, contact person or phone.
    pub search: Option<String>,
    pub vendor_type: Option<VendorType>,
    pub status: Option<RecordStatus>,
    pub country: Option<String>,
}

#[derive(Debug, Clone)]
pub struct VendorRepository {
    pool: SqlitePool,
}

impl VendorRepository {
    pub fn new(pool: SqlitePool) -> Self {
        VendorRepository { pool }
    }

    pub async fn create(&self, owner_id: &str, mut input: VendorInput) -> DbResult<Vendor> {
        input.validate()?;
        let now = Utc::now();

        let vendor = Vendor {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            name: input.name,
            contact_person: input.contact_person,
            phone: input.phone,
            email: input.email,
            address: input.address,
            city: input.city,
            state: input.state,
            zip: input.zip,
            country: input.country,
            vendor_type: input.vendor_type,
            tax_id: input.tax_id,
            account_number: input.account_number,
            ifsc_code: input.ifsc_code,
            notes: input.notes,
            status: input.status,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO vendors (
                id, owner_id, name, contact_person, phone, email, address, city, state, zip,
                country, vendor_type, tax_id, account_number, ifsc_code, notes, status,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                ?11, ?12, ?13, ?14, ?15, ?16, ?17,
                ?18, ?19
            )
            "#,
        )
        .bind(&vendor.id)
        .bind(&vendor.owner_id)
        .bind(&vendor.name)
        .bind(&vendor.contact_person)
        .bind(&vendor.phone)
        .bind(&vendor.email)
        .bind(&vendor.address)
        .bind(&vendor.city)
        .bind(&vendor.state)
        .bind(&vendor.zip)
        .bind(&vendor.country)
        .bind(vendor.vendor_type)
        .bind(&vendor.tax_id)
        .bind(&vendor.account_number)
        .bind(&vendor.ifsc_code)
        .bind(&vendor.notes)
        .bind(vendor.status)
        .bind(vendor.created_at)
        .bind(vendor.updated_at)
        .execute(&self.pool)
        .await?;

        debug!(id = %vendor.id, "Vendor created");
        Ok(vendor)
    }

    pub async fn get(&self, owner_id: &str, id: &str) -> DbResult<Vendor> {
        sqlx::query_as::<_, Vendor>("SELECT * FROM vendors WHERE id = ?1 AND owner_id = ?2")
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Vendor", id))
    }

    /// Newest first.
    pub async fn list(&self, owner_id: &str, filter: &VendorFilter) -> DbResult<Vec<Vendor>> {
        let search = match &filter.search {
            Some(s) => Some(validate_search_query(s)?).filter(|s| !s.is_empty()),
            None => None,
        };

        let vendors = sqlx::query_as::<_, Vendor>(
            r#"
            SELECT * FROM vendors
            WHERE owner_id = ?1
              AND (?2 IS NULL OR name LIKE ?2 OR contact_person LIKE ?2 OR phone LIKE ?2)
              AND (?3 IS NULL OR vendor_type = ?3)
              AND (?4 IS NULL OR status = ?4)
              AND (?5 IS NULL OR country = ?5)
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .bind(search.as_deref().map(like_pattern))
        .bind(filter.vendor_type)
        .bind(filter.status)
        .bind(&filter.country)
        .fetch_all(&self.pool)
        .await?;

        Ok(vendors)
    }

    /// Replaces every editable field.
    pub async fn update(&self, owner_id: &str, id: &str, mut input: VendorInput) -> DbResult<Vendor> {
        input.validate()?;

        let result = sqlx::query(
            r#"
            UPDATE vendors SET
                name = ?3, contact_person = ?4, phone = ?5, email = ?6, address = ?7,
                city = ?8, state = ?9, zip = ?10, country = ?11, vendor_type = ?12,
                tax_id = ?13, account_number = ?14, ifsc_code = ?15, notes = ?16,
                status = ?17, updated_at = ?18
            WHERE id = ?1 AND owner_id = ?2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(&input.name)
        .bind(&input.contact_person)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.address)
        .bind(&input.city)
        .bind(&input.state)
        .bind(&input.zip)
        .bind(&input.country)
        .bind(input.vendor_type)
        .bind(&input.tax_id)
        .bind(&input.account_number)
        .bind(&input.ifsc_code)
        .bind(&input.notes)
        .bind(input.status)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Vendor", id));
        }
        self.get(owner_id, id).await
    }

    pub async fn delete(&self, owner_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM vendors WHERE id = ?1 AND owner_id = ?2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Vendor", id));
        }
        info!(id = %id, "Vendor deleted");
        Ok(())
    }

    pub async fn activate(&self, owner_id: &str, id: &str) -> DbResult<Vendor> {
        let result = sqlx::query(
            "UPDATE vendors SET status = ?3, updated_at = ?4 WHERE id = ?1 AND owner_id = ?2",
        )
        .bind(id)
        .bind(owner_id)
        .bind(RecordStatus::Active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Vendor", id));
        }
        self.get(owner_id, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testing;

    fn input(name: &str, contact: &str) -> VendorInput {
        serde_json::from_value(serde_json::json!({
            "name": name,
            "contact_person": contact,
            "phone": "9822222222",
            "vendor_type": "distributor",
            "status": "inactive",
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_defaults_and_activate() {
        let db = testing::database().await;
        let owner = testing::owner(&db, "owner@shop.in").await;

        let v = db.vendors().create(&owner, input("Agro Traders", "Suresh")).await.unwrap();
        assert_eq!(v.country, "India");
        assert_eq!(v.status, RecordStatus::Inactive);

        let v = db.vendors().activate(&owner, &v.id).await.unwrap();
        assert_eq!(v.status, RecordStatus::Active);
    }

    #[tokio::test]
    async fn test_search_and_filters() {
        let db = testing::database().await;
        let owner = testing::owner(&db, "owner@shop.in").await;
        let repo = db.vendors();

        repo.create(&owner, input("Agro Traders", "Suresh")).await.unwrap();
        repo.create(&owner, input("Dairy Co", "Lata")).await.unwrap();

        let by_contact = VendorFilter {
            search: Some("lata".to_string()),
            ..Default::default()
        };
        let found = repo.list(&owner, &by_contact).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Dairy Co");

        let distributors = VendorFilter {
            vendor_type: Some(VendorType::Distributor),
            country: Some("India".to_string()),
            ..Default::default()
        };
        assert_eq!(repo.list(&owner, &distributors).await.unwrap().len(), 2);

        let other = testing::owner(&db, "other@shop.in").await;
        assert!(repo.list(&other, &VendorFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = testing::database().await;
        let owner = testing::owner(&db, "owner@shop.in").await;
        let v = db.vendors().create(&owner, input("Agro Traders", "Suresh")).await.unwrap();

        let updated = db
            .vendors()
            .update(&owner, &v.id, input("Agro Traders Pvt", "Suresh"))
            .await
            .unwrap();
        assert_eq!(updated.name, "Agro Traders Pvt");

        db.vendors().delete(&owner, &v.id).await.unwrap();
        assert!(db.vendors().get(&owner, &v.id).await.is_err());
    }
}
