//! # Subscription State Machine
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌──────────────────┐  create   ┌──────────┐  check_status   ┌─────────┐│
//! │   │ no subscription  │──────────►│  active  │───(now > end)──►│ expired ││
//! │   │ plan: inactive   │           │          │                 │terminal ││
//! │   └──────────────────┘           └──────────┘                 └─────────┘│
//! │            ▲                          ▲                            │    │
//! │            │                          └──────── create (new) ──────┘    │
//! │                                                                         │
//! │   Admin toggle flips the cached plan_status only:                       │
//! │     active → expired,  anything else → active                           │
//! │   The next check_status may move it back to expired when the latest     │
//! │   subscription is past its end date.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Expiry is lazy: nothing runs in the background. The decision is made
//! here, the database applies it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::{Plan, PlanStatus, SubscriptionStatus, UserSubscription};
use crate::validation::{non_blank, validate_name, validate_non_negative, ValidationResult};

/// End of a subscription window starting at `start`.
pub fn subscription_end(
    start: DateTime<Utc>,
    duration_minutes: i64,
) -> ValidationResult<DateTime<Utc>> {
    if duration_minutes <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "duration_minutes".to_string(),
        });
    }

    Duration::try_minutes(duration_minutes)
        .and_then(|d| start.checked_add_signed(d))
        .ok_or_else(|| ValidationError::InvalidFormat {
            field: "duration_minutes".to_string(),
            reason: "window ends beyond the supported date range".to_string(),
        })
}

/// What `check_status` has to do for an owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCheck {
    /// Owner never subscribed; report "inactive".
    NoSubscription,
    /// Latest subscription is within its window; no mutation.
    Current,
    /// Latest subscription is past its end; mark it and the owner expired.
    Expire,
}

/// Decides the outcome of a status check against the latest subscription.
///
/// The `Expire` decision is repeated on every check past the end date;
/// applying it twice leaves the same state.
pub fn check_status(latest: Option<&UserSubscription>, now: DateTime<Utc>) -> StatusCheck {
    match latest {
        None => StatusCheck::NoSubscription,
        Some(sub) if sub.is_active(now) => StatusCheck::Current,
        Some(_) => StatusCheck::Expire,
    }
}

/// Status a subscription record should carry after a check.
pub fn status_after_check(check: StatusCheck, current: SubscriptionStatus) -> SubscriptionStatus {
    match check {
        StatusCheck::Expire => SubscriptionStatus::Expired,
        _ => current,
    }
}

/// The administrative override of the cached plan status.
pub fn toggle_plan_status(current: PlanStatus) -> PlanStatus {
    match current {
        PlanStatus::Active => PlanStatus::Expired,
        PlanStatus::Inactive | PlanStatus::Expired => PlanStatus::Active,
    }
}

// =============================================================================
// Inputs & Reports
// =============================================================================

/// Body of plan creation (admin).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewPlan {
    pub name: String,
    pub price_cents: i64,
    pub duration_minutes: i64,
}

impl NewPlan {
    pub fn validate(&mut self) -> ValidationResult<()> {
        self.name = self.name.trim().to_string();
        validate_name(&self.name, "name")?;
        validate_non_negative(self.price_cents, "price")?;
        if self.duration_minutes <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "duration_minutes".to_string(),
            });
        }
        Ok(())
    }
}

/// Body of subscription creation. The window defaults to
/// `[now, now + plan duration]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSubscription {
    pub plan_id: String,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payment_id: Option<String>,
}

impl NewSubscription {
    /// Resolves the subscription window against `plan`.
    pub fn window(
        &self,
        plan: &Plan,
        now: DateTime<Utc>,
    ) -> ValidationResult<(DateTime<Utc>, DateTime<Utc>)> {
        let start = self.start_date.unwrap_or(now);
        let end = match self.end_date {
            Some(end) => end,
            None => subscription_end(start, plan.duration_minutes)?,
        };
        if end < start {
            return Err(ValidationError::InvalidFormat {
                field: "end_date".to_string(),
                reason: "ends before it starts".to_string(),
            });
        }
        Ok((start, end))
    }

    pub fn payment_reference(&self) -> Option<String> {
        non_blank(self.payment_id.clone())
    }
}

/// Answer to "what is my plan status".
///
/// Only `plan_status` is present for an owner who never subscribed.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct SubscriptionReport {
    pub plan_status: PlanStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SubscriptionStatus>,
}

impl SubscriptionReport {
    pub fn inactive() -> SubscriptionReport {
        SubscriptionReport {
            plan_status: PlanStatus::Inactive,
            plan: None,
            start_date: None,
            end_date: None,
            status: None,
        }
    }

    pub fn for_subscription(
        plan_status: PlanStatus,
        plan: Option<String>,
        sub: &UserSubscription,
    ) -> SubscriptionReport {
        SubscriptionReport {
            plan_status,
            plan,
            start_date: Some(sub.start_date),
            end_date: Some(sub.end_date),
            status: Some(sub.status),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
