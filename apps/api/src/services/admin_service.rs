//! Admin views over all accounts.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use shopbill_core::{Account, PlanStatus, Profile};
use shopbill_db::ProductSalesSummary;

use super::today;
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct StatusToggled {
    pub status: &'static str,
    pub plan_status: PlanStatus,
}

#[derive(Debug, Serialize)]
pub struct UserDetails {
    pub user: Profile,
    pub products: Vec<ProductSalesSummary>,
}

pub async fn list_users(State(state): State<AppState>, user: CurrentUser) -> ApiResult<Json<Vec<Account>>> {
    user.require_admin()?;
    Ok(Json(state.db.accounts().list().await?))
}

/// `PATCH /users/{id}/status`: flips the cached plan status. The next
/// status check past the latest end date sets it back to expired.
pub async fn toggle_status(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<StatusToggled>> {
    user.require_admin()?;
    let plan_status = state.db.subscriptions().toggle_plan_status(&id).await?;
    Ok(Json(StatusToggled {
        status: "updated",
        plan_status,
    }))
}

/// `GET /users/{id}/details`: profile plus every product with units sold.
pub async fn details(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<UserDetails>> {
    user.require_admin()?;
    let profile = state.db.accounts().profile(&id).await?;
    let products = state.db.products().sales_summary(&id, today()).await?;
    Ok(Json(UserDetails {
        user: profile,
        products,
    }))
}
