//! # Subscription Repository
//!
//! Plans, owner subscriptions and the cached `users.plan_status`.
//!
//! Expiry is applied lazily by [`SubscriptionRepository::check_status`]:
//! the decision comes from `shopbill_core::subscription::check_status`, and
//! the subscription row and the owner row are flipped together in one
//! transaction. The owner flip is skipped when any subscription still runs
//! at `now`, so a subscribe racing the check keeps the owner active.
//! Running the flip twice changes nothing.

use chrono::{DateTime, Utc};
use shopbill_core::subscription::{
    check_status, status_after_check, toggle_plan_status, NewPlan, NewSubscription, StatusCheck,
    SubscriptionReport,
};
use shopbill_core::{Plan, PlanStatus, SubscriptionStatus, UserSubscription};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};

#[derive(sqlx::FromRow)]
struct LatestSubscription {
    #[sqlx(flatten)]
    subscription: UserSubscription,
    plan_name: Option<String>,
}

/// Repository for plans and subscriptions.
#[derive(Debug, Clone)]
pub struct SubscriptionRepository {
    pool: SqlitePool,
}

impl SubscriptionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SubscriptionRepository { pool }
    }

    pub async fn create_plan(&self, mut input: NewPlan) -> DbResult<Plan> {
        input.validate()?;

        let plan = Plan {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            price_cents: input.price_cents,
            duration_minutes: input.duration_minutes,
        };

        sqlx::query("INSERT INTO plans (id, name, price_cents, duration_minutes) VALUES (?1, ?2, ?3, ?4)")
            .bind(&plan.id)
            .bind(&plan.name)
            .bind(plan.price_cents)
            .bind(plan.duration_minutes)
            .execute(&self.pool)
            .await?;

        info!(id = %plan.id, name = %plan.name, "Plan created");
        Ok(plan)
    }

    /// All plans, cheapest first.
    pub async fn list_plans(&self) -> DbResult<Vec<Plan>> {
        let plans = sqlx::query_as::<_, Plan>("SELECT * FROM plans ORDER BY price_cents, name")
            .fetch_all(&self.pool)
            .await?;
        Ok(plans)
    }

    pub async fn get_plan(&self, id: &str) -> DbResult<Plan> {
        sqlx::query_as::<_, Plan>("SELECT * FROM plans WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Plan", id))
    }

    /// Starts a fresh active subscription and marks the owner active.
    pub async fn subscribe(
        &self,
        owner_id: &str,
        input: NewSubscription,
        now: DateTime<Utc>,
    ) -> DbResult<SubscriptionReport> {
        let plan = self.get_plan(&input.plan_id).await?;
        let (start_date, end_date) = input.window(&plan, now)?;

        let subscription = UserSubscription {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            plan_id: Some(plan.id.clone()),
            start_date,
            end_date,
            payment_id: input.payment_reference(),
            status: SubscriptionStatus::Active,
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO user_subscriptions (id, owner_id, plan_id, start_date, end_date, payment_id, status)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&subscription.id)
        .bind(&subscription.owner_id)
        .bind(&subscription.plan_id)
        .bind(subscription.start_date)
        .bind(subscription.end_date)
        .bind(&subscription.payment_id)
        .bind(subscription.status)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query("UPDATE users SET plan_status = ?2 WHERE id = ?1")
            .bind(owner_id)
            .bind(PlanStatus::Active)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Account", owner_id));
        }

        tx.commit().await?;

        info!(owner = %owner_id, plan = %plan.name, end = %subscription.end_date, "Subscription started");
        Ok(SubscriptionReport::for_subscription(
            PlanStatus::Active,
            Some(plan.name),
            &subscription,
        ))
    }

    /// Reports the owner's plan status, expiring the latest subscription
    /// first when `now` is past its end.
    pub async fn check_status(&self, owner_id: &str, now: DateTime<Utc>) -> DbResult<SubscriptionReport> {
        let latest = self.latest(owner_id).await?;
        let check = check_status(latest.as_ref().map(|l| &l.subscription), now);

        if let (StatusCheck::Expire, Some(stale)) = (check, &latest) {
            self.expire(owner_id, &stale.subscription, now).await?;
        }

        // Re-read: a subscribe that committed after `latest` was loaded
        // is the one to report.
        let latest = self.latest(owner_id).await?;
        let check = check_status(latest.as_ref().map(|l| &l.subscription), now);
        let Some(LatestSubscription {
            mut subscription,
            plan_name,
        }) = latest
        else {
            return Ok(SubscriptionReport::inactive());
        };
        subscription.status = status_after_check(check, subscription.status);

        let plan_status = self.plan_status(owner_id).await?;
        debug!(owner = %owner_id, ?check, plan_status = plan_status.as_str(), "Checked subscription");

        Ok(SubscriptionReport::for_subscription(
            plan_status,
            plan_name,
            &subscription,
        ))
    }

    async fn latest(&self, owner_id: &str) -> DbResult<Option<LatestSubscription>> {
        let latest = sqlx::query_as::<_, LatestSubscription>(
            r#"
            SELECT s.*, p.name AS plan_name
            FROM user_subscriptions s
            LEFT JOIN plans p ON p.id = s.plan_id
            WHERE s.owner_id = ?1
            ORDER BY s.end_date DESC
            LIMIT 1
            "#,
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(latest)
    }

    /// Marks `stale` and the owner expired, unless a subscription still
    /// running at `now` exists by the time the write lock is held.
    async fn expire(&self, owner_id: &str, stale: &UserSubscription, now: DateTime<Utc>) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let owner = sqlx::query(
            r#"
            UPDATE users SET plan_status = ?2
            WHERE id = ?1
              AND NOT EXISTS (
                  SELECT 1 FROM user_subscriptions
                  WHERE owner_id = ?1 AND end_date >= ?3
              )
            "#,
        )
        .bind(owner_id)
        .bind(PlanStatus::Expired)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE user_subscriptions SET status = ?2 WHERE id = ?1 AND end_date < ?3")
            .bind(&stale.id)
            .bind(SubscriptionStatus::Expired)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        if owner.rows_affected() == 0 {
            debug!(owner = %owner_id, "Running subscription found, plan status kept");
        } else if stale.status != SubscriptionStatus::Expired {
            info!(owner = %owner_id, subscription = %stale.id, "Subscription expired");
        }
        Ok(())
    }

    /// Flips the owner's cached plan status without touching subscriptions.
    ///
    /// A later `check_status` past the latest end date sets it back to
    /// expired.
    pub async fn toggle_plan_status(&self, owner_id: &str) -> DbResult<PlanStatus> {
        let current = self.plan_status(owner_id).await?;
        let next = toggle_plan_status(current);

        // Compare-and-set: a concurrent toggle makes this a no-op instead of
        // a double flip.
        let result = sqlx::query("UPDATE users SET plan_status = ?3 WHERE id = ?1 AND plan_status = ?2")
            .bind(owner_id)
            .bind(current)
            .bind(next)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return self.plan_status(owner_id).await;
        }

        info!(owner = %owner_id, from = current.as_str(), to = next.as_str(), "Plan status toggled");
        Ok(next)
    }

    pub async fn plan_status(&self, owner_id: &str) -> DbResult<PlanStatus> {
        sqlx::query_scalar::<_, PlanStatus>("SELECT plan_status FROM users WHERE id = ?1")
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Account", owner_id))
    }
}
