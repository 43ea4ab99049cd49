//! Plans and the caller's subscription.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use shopbill_core::subscription::{NewPlan, NewSubscription, SubscriptionReport};
use shopbill_core::Plan;

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::AppState;

pub async fn list_plans(State(state): State<AppState>, _user: CurrentUser) -> ApiResult<Json<Vec<Plan>>> {
    Ok(Json(state.db.subscriptions().list_plans().await?))
}

pub async fn get_plan(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Plan>> {
    Ok(Json(state.db.subscriptions().get_plan(&id).await?))
}

/// Admin only.
pub async fn create_plan(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(input): Json<NewPlan>,
) -> ApiResult<(StatusCode, Json<Plan>)> {
    user.require_admin()?;
    let plan = state.db.subscriptions().create_plan(input).await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

/// `POST /subscriptions`: payment is taken elsewhere; `payment_id` is
/// stored as given.
pub async fn subscribe(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(input): Json<NewSubscription>,
) -> ApiResult<(StatusCode, Json<SubscriptionReport>)> {
    let report = state
        .db
        .subscriptions()
        .subscribe(user.id(), input, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// `GET /subscriptions/status`: expires the latest subscription if its
/// end has passed, then reports.
pub async fn status(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<SubscriptionReport>> {
    let report = state
        .db
        .subscriptions()
        .check_status(user.id(), Utc::now())
        .await?;
    Ok(Json(report))
}
