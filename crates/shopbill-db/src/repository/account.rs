//! # Account Repository
//!
//! Shop owner accounts and the profile data printed on invoices: bank
//! details (one per account) and the ordered list of terms.
//!
//! Password hashes are written and read here but never leave the crate
//! inside an [`Account`]; the API layer gets them only through
//! [`AccountRepository::credentials`].

use chrono::Utc;
use shopbill_core::account::{ProfileUpdate, Registration};
use shopbill_core::{Account, BankDetails, Profile, Term};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};

#[derive(sqlx::FromRow)]
struct AccountWithHash {
    #[sqlx(flatten)]
    account: Account,
    password_hash: String,
}

/// Repository for accounts and shop profiles.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: SqlitePool,
}

impl AccountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AccountRepository { pool }
    }

    /// Inserts a validated registration.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - email already registered
    pub async fn create(&self, registration: Registration, password_hash: &str) -> DbResult<Account> {
        let account = Account {
            id: Uuid::new_v4().to_string(),
            email: registration.email,
            username: registration.username,
            shop_name: registration.shop_name,
            phone: registration.phone,
            gst_number: registration.gst_number,
            address: registration.address,
            upi_id: None,
            signature: None,
            show_customer_details: true,
            print_automatically: false,
            show_signature: true,
            referred_by: registration.referred_by,
            is_admin: false,
            plan_status: Default::default(),
            created_at: Utc::now(),
        };

        debug!(id = %account.id, email = %account.email, "Creating account");

        sqlx::query(
            r#"
            INSERT INTO users (
                id, email, username, password_hash, shop_name, phone,
                gst_number, address, upi_id, signature,
                show_customer_details, print_automatically, show_signature,
                referred_by, is_admin, plan_status, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10,
                ?11, ?12, ?13,
                ?14, ?15, ?16, ?17
            )
            "#,
        )
        .bind(&account.id)
        .bind(&account.email)
        .bind(&account.username)
        .bind(password_hash)
        .bind(&account.shop_name)
        .bind(&account.phone)
        .bind(&account.gst_number)
        .bind(&account.address)
        .bind(&account.upi_id)
        .bind(&account.signature)
        .bind(account.show_customer_details)
        .bind(account.print_automatically)
        .bind(account.show_signature)
        .bind(&account.referred_by)
        .bind(account.is_admin)
        .bind(account.plan_status)
        .bind(account.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            err if err.is_unique_violation_on("email") => DbError::duplicate("email", &account.email),
            err => err,
        })?;

        info!(id = %account.id, "Account registered");
        Ok(account)
    }

    /// Whether an account with this (normalized) email exists.
    pub async fn email_exists(&self, email: &str) -> DbResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Account and password hash for a login attempt.
    pub async fn credentials(&self, email: &str) -> DbResult<Option<(Account, String)>> {
        let row = sqlx::query_as::<_, AccountWithHash>("SELECT * FROM users WHERE email = ?1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| (r.account, r.password_hash)))
    }

    pub async fn get(&self, id: &str) -> DbResult<Account> {
        let mut conn = self.pool.acquire().await?;
        fetch_account(&mut conn, id).await
    }

    /// Every account, oldest first. Admin only.
    pub async fn list(&self) -> DbResult<Vec<Account>> {
        let accounts = sqlx::query_as::<_, Account>("SELECT * FROM users ORDER BY created_at, email")
            .fetch_all(&self.pool)
            .await?;
        Ok(accounts)
    }

    /// Account with bank details and ordered terms.
    pub async fn profile(&self, id: &str) -> DbResult<Profile> {
        let mut conn = self.pool.acquire().await?;
        load_profile(&mut conn, id).await
    }

    /// Applies a profile update in one transaction.
    ///
    /// Bank details are upserted when present; terms are replaced wholesale
    /// when present.
    pub async fn update_profile(&self, id: &str, mut update: ProfileUpdate) -> DbResult<Profile> {
        let mut account = self.get(id).await?;
        update.apply(&mut account)?;
        let terms = update.ordered_terms();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE users SET
                username = ?2,
                shop_name = ?3,
                phone = ?4,
                gst_number = ?5,
                address = ?6,
                upi_id = ?7,
                signature = ?8,
                show_customer_details = ?9,
                print_automatically = ?10,
                show_signature = ?11
            WHERE id = ?1
            "#,
        )
        .bind(&account.id)
        .bind(&account.username)
        .bind(&account.shop_name)
        .bind(&account.phone)
        .bind(&account.gst_number)
        .bind(&account.address)
        .bind(&account.upi_id)
        .bind(&account.signature)
        .bind(account.show_customer_details)
        .bind(account.print_automatically)
        .bind(account.show_signature)
        .execute(&mut *tx)
        .await?;

        if let Some(bank) = &update.bank_details {
            sqlx::query(
                r#"
                INSERT INTO bank_details (user_id, bank_name, account_number, ifsc_code, branch)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(user_id) DO UPDATE SET
                    bank_name = excluded.bank_name,
                    account_number = excluded.account_number,
                    ifsc_code = excluded.ifsc_code,
                    branch = excluded.branch
                "#,
            )
            .bind(id)
            .bind(&bank.bank_name)
            .bind(&bank.account_number)
            .bind(&bank.ifsc_code)
            .bind(&bank.branch)
            .execute(&mut *tx)
            .await?;
        }

        if let Some(terms) = &terms {
            sqlx::query("DELETE FROM terms WHERE user_id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await?;

            for term in terms {
                sqlx::query("INSERT INTO terms (user_id, term, sort_order) VALUES (?1, ?2, ?3)")
                    .bind(id)
                    .bind(&term.term)
                    .bind(term.order)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        let profile = load_profile(&mut tx, id).await?;
        tx.commit().await?;

        info!(id = %id, "Profile updated");
        Ok(profile)
    }

    /// Replaces the password hash of the account with this email.
    pub async fn set_password(&self, email: &str, password_hash: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET password_hash = ?2 WHERE email = ?1")
            .bind(email)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Account", email));
        }

        info!(email = %email, "Password reset");
        Ok(())
    }

    /// Grants or revokes admin rights. Used by the seed binary.
    pub async fn set_admin(&self, id: &str, is_admin: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET is_admin = ?2 WHERE id = ?1")
            .bind(id)
            .bind(is_admin)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Account", id));
        }
        Ok(())
    }
}

pub(crate) async fn fetch_account(conn: &mut SqliteConnection, id: &str) -> DbResult<Account> {
    sqlx::query_as::<_, Account>("SELECT * FROM users WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Account", id))
}

pub(crate) async fn load_profile(conn: &mut SqliteConnection, id: &str) -> DbResult<Profile> {
    let account = fetch_account(conn, id).await?;

    let bank_details = sqlx::query_as::<_, BankDetails>(
        "SELECT bank_name, account_number, ifsc_code, branch FROM bank_details WHERE user_id = ?1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    let terms = sqlx::query_as::<_, Term>(
        r#"SELECT term, sort_order AS "order" FROM terms WHERE user_id = ?1 ORDER BY sort_order, id"#,
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Profile {
        account,
        bank_details,
        terms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testing;
    use shopbill_core::PlanStatus;

    #[tokio::test]
    async fn test_create_and_find_credentials() {
        let db = testing::database().await;
        let account = db
            .accounts()
            .create(testing::registration("owner@shop.in"), "hash-1")
            .await
            .unwrap();

        assert_eq!(account.plan_status, PlanStatus::Inactive);
        assert!(db.accounts().email_exists("owner@shop.in").await.unwrap());
        assert!(!db.accounts().email_exists("other@shop.in").await.unwrap());

        let (found, hash) = db.accounts().credentials("owner@shop.in").await.unwrap().unwrap();
        assert_eq!(found.id, account.id);
        assert_eq!(hash, "hash-1");
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let db = testing::database().await;
        testing::owner(&db, "owner@shop.in").await;

        let err = db
            .accounts()
            .create(testing::registration("owner@shop.in"), "hash")
            .await
            .unwrap_err();
        assert!(err.is_unique_violation_on("email"));
    }

    #[tokio::test]
    async fn test_update_profile_upserts_bank_and_replaces_terms() {
        let db = testing::database().await;
        let id = testing::owner(&db, "owner@shop.in").await;

        let update = ProfileUpdate {
            upi_id: Some("sharma@upi".to_string()),
            bank_details: Some(BankDetails {
                bank_name: "State Bank".to_string(),
                account_number: "0001234".to_string(),
                ifsc_code: "SBIN0000001".to_string(),
                branch: None,
            }),
            terms: Some(vec!["No returns".to_string(), "E&OE".to_string()]),
            ..ProfileUpdate::default()
        };
        let profile = db.accounts().update_profile(&id, update).await.unwrap();
        assert_eq!(profile.account.upi_id.as_deref(), Some("sharma@upi"));
        assert_eq!(profile.terms.len(), 2);
        assert_eq!(profile.terms[0].term, "No returns");

        let update = ProfileUpdate {
            bank_details: Some(BankDetails {
                bank_name: "State Bank".to_string(),
                account_number: "0009999".to_string(),
                ifsc_code: "SBIN0000001".to_string(),
                branch: Some("Main".to_string()),
            }),
            terms: Some(vec!["Only this".to_string()]),
            ..ProfileUpdate::default()
        };
        let profile = db.accounts().update_profile(&id, update).await.unwrap();
        let bank = profile.bank_details.unwrap();
        assert_eq!(bank.account_number, "0009999");
        assert_eq!(profile.terms.len(), 1);
        assert_eq!(profile.terms[0].term, "Only this");
        assert_eq!(profile.terms[0].order, 0);

        // terms untouched when absent
        let profile = db
            .accounts()
            .update_profile(&id, ProfileUpdate::default())
            .await
            .unwrap();
        assert_eq!(profile.terms.len(), 1);
    }

    #[tokio::test]
    async fn test_set_password_unknown_email() {
        let db = testing::database().await;
        let err = db.accounts().set_password("nobody@shop.in", "h").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
