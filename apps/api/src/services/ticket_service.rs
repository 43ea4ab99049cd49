//! Support tickets. Owners see their own; admins see and answer all.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use shopbill_core::directory::{NewTicket, TicketFeedback, TicketWithAttachments};
use shopbill_db::Viewer;

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::AppState;

fn viewer(user: &CurrentUser) -> Viewer<'_> {
    Viewer {
        user_id: user.id(),
        is_admin: user.is_admin(),
    }
}

pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<TicketWithAttachments>>> {
    let tickets = state.db.tickets().list(viewer(&user)).await?;
    Ok(Json(tickets))
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(input): Json<NewTicket>,
) -> ApiResult<(StatusCode, Json<TicketWithAttachments>)> {
    let ticket = state.db.tickets().create(user.id(), input).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

pub async fn get(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<TicketWithAttachments>> {
    let ticket = state.db.tickets().get(viewer(&user), &id).await?;
    Ok(Json(ticket))
}

/// Admin only. Resolving or closing needs non-empty feedback.
pub async fn provide_feedback(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(feedback): Json<TicketFeedback>,
) -> ApiResult<Json<TicketWithAttachments>> {
    user.require_admin()?;
    let ticket = state.db.tickets().provide_feedback(&id, feedback).await?;
    Ok(Json(ticket))
}
