//! # Bill Settings Repository
//!
//! One settings row per owner, created with defaults the first time it is
//! read.

use chrono::Utc;
use shopbill_core::directory::{BillSettings, BillSettingsUpdate};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::DbResult;

#[derive(Debug, Clone)]
pub struct BillSettingsRepository {
    pool: SqlitePool,
}

impl BillSettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BillSettingsRepository { pool }
    }

    /// The owner's settings, inserting defaults on first access.
    pub async fn get_or_create(&self, owner_id: &str) -> DbResult<BillSettings> {
        let mut conn = self.pool.acquire().await?;
        ensure(&mut conn, owner_id).await
    }

    /// Applies a partial update. Serves both PUT and PATCH.
    pub async fn update(&self, owner_id: &str, update: BillSettingsUpdate) -> DbResult<BillSettings> {
        let mut tx = self.pool.begin().await?;
        let mut settings = ensure(&mut tx, owner_id).await?;
        update.apply(&mut settings, Utc::now())?;

        sqlx::query(
            r#"
            UPDATE bill_settings SET
                header = ?2, subheader = ?3, footer = ?4,
                tax_enabled = ?5, tax_rate_bps = ?6, discount_enabled = ?7,
                print_automatically = ?8, show_logo = ?9, logo = ?10,
                show_signature = ?11, signature = ?12, gst_number = ?13, upi_id = ?14,
                terms_and_conditions = ?15, show_customer_details = ?16,
                default_payment_method = ?17, default_currency = ?18,
                default_category = ?19, default_unit = ?20, default_gst_rate = ?21,
                tax_type_on_sale = ?22, updated_at = ?23
            WHERE owner_id = ?1
            "#,
        )
        .bind(owner_id)
        .bind(&settings.header)
        .bind(&settings.subheader)
        .bind(&settings.footer)
        .bind(settings.tax_enabled)
        .bind(settings.tax_rate_bps)
        .bind(settings.discount_enabled)
        .bind(settings.print_automatically)
        .bind(settings.show_logo)
        .bind(&settings.logo)
        .bind(settings.show_signature)
        .bind(&settings.signature)
        .bind(&settings.gst_number)
        .bind(&settings.upi_id)
        .bind(&settings.terms_and_conditions)
        .bind(settings.show_customer_details)
        .bind(settings.default_payment_method)
        .bind(&settings.default_currency)
        .bind(&settings.default_category)
        .bind(&settings.default_unit)
        .bind(&settings.default_gst_rate)
        .bind(settings.tax_type_on_sale)
        .bind(settings.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(owner = %owner_id, "Bill settings updated");
        Ok(settings)
    }
}

async fn ensure(conn: &mut SqliteConnection, owner_id: &str) -> DbResult<BillSettings> {
    let d = BillSettings::defaults(owner_id.to_string(), Utc::now());

    let inserted = sqlx::query(
        r#"
        INSERT INTO bill_settings (
            owner_id, header, subheader, footer,
            tax_enabled, tax_rate_bps, discount_enabled,
            print_automatically, show_logo, logo, show_signature, signature,
            gst_number, upi_id, terms_and_conditions, show_customer_details,
            default_payment_method, default_currency, default_category, default_unit,
            default_gst_rate, tax_type_on_sale, created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4,
            ?5, ?6, ?7,
            ?8, ?9, ?10, ?11, ?12,
            ?13, ?14, ?15, ?16,
            ?17, ?18, ?19, ?20,
            ?21, ?22, ?23, ?24
        )
        ON CONFLICT(owner_id) DO NOTHING
        "#,
    )
    .bind(&d.owner_id)
    .bind(&d.header)
    .bind(&d.subheader)
    .bind(&d.footer)
    .bind(d.tax_enabled)
    .bind(d.tax_rate_bps)
    .bind(d.discount_enabled)
    .bind(d.print_automatically)
    .bind(d.show_logo)
    .bind(&d.logo)
    .bind(d.show_signature)
    .bind(&d.signature)
    .bind(&d.gst_number)
    .bind(&d.upi_id)
    .bind(&d.terms_and_conditions)
    .bind(d.show_customer_details)
    .bind(d.default_payment_method)
    .bind(&d.default_currency)
    .bind(&d.default_category)
    .bind(&d.default_unit)
    .bind(&d.default_gst_rate)
    .bind(d.tax_type_on_sale)
    .bind(d.created_at)
    .bind(d.updated_at)
    .execute(&mut *conn)
    .await?;

    if inserted.rows_affected() > 0 {
        debug!(owner = %owner_id, "Created default bill settings");
    }

    let settings = sqlx::query_as::<_, BillSettings>("SELECT * FROM bill_settings WHERE owner_id = ?1")
        .bind(owner_id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::repository::testing;
    use shopbill_core::directory::TaxType;
    use shopbill_core::PaymentMethod;

    #[tokio::test]
    async fn test_defaults_on_first_access() {
        let db = testing::database().await;
        let owner = testing::owner(&db, "owner@shop.in").await;

        let s = db.bill_settings().get_or_create(&owner).await.unwrap();
        assert_eq!(s.header, "Your Business Name");
        assert_eq!(s.tax_rate_bps, 1800);
        assert_eq!(s.default_currency, "INR");
        assert_eq!(s.default_payment_method, PaymentMethod::Cash);
        assert_eq!(s.tax_type_on_sale, TaxType::Inclusive);

        // second access reuses the row
        let again = db.bill_settings().get_or_create(&owner).await.unwrap();
        assert_eq!(again.created_at, s.created_at);
    }

    #[tokio::test]
    async fn test_partial_update() {
        let db = testing::database().await;
        let owner = testing::owner(&db, "owner@shop.in").await;

        let update = BillSettingsUpdate {
            footer: Some("Visit again".to_string()),
            tax_type_on_sale: Some(TaxType::Exclusive),
            ..BillSettingsUpdate::default()
        };
        let s = db.bill_settings().update(&owner, update).await.unwrap();
        assert_eq!(s.footer, "Visit again");
        assert_eq!(s.header, "Your Business Name");

        let stored = db.bill_settings().get_or_create(&owner).await.unwrap();
        assert_eq!(stored.tax_type_on_sale, TaxType::Exclusive);
    }

    #[tokio::test]
    async fn test_invalid_currency_rejected() {
        let db = testing::database().await;
        let owner = testing::owner(&db, "owner@shop.in").await;

        let update = BillSettingsUpdate {
            default_currency: Some("RUPEE".to_string()),
            ..BillSettingsUpdate::default()
        };
        let err = db.bill_settings().update(&owner, update).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }
}
