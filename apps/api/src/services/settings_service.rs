//! `/bill-settings/mine`: the caller's invoice template settings.

use axum::extract::State;
use axum::Json;
use shopbill_core::directory::{BillSettings, BillSettingsUpdate};

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::AppState;

/// `GET`: created with defaults on first access.
pub async fn mine(State(state): State<AppState>, user: CurrentUser) -> ApiResult<Json<BillSettings>> {
    let settings = state.db.bill_settings().get_or_create(user.id()).await?;
    Ok(Json(settings))
}

/// `PUT` and `PATCH` both merge the supplied fields.
pub async fn update_mine(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(update): Json<BillSettingsUpdate>,
) -> ApiResult<Json<BillSettings>> {
    let settings = state.db.bill_settings().update(user.id(), update).await?;
    Ok(Json(settings))
}
