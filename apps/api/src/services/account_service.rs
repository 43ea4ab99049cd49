//! Registration, login and the owner's shop profile.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use shopbill_core::account::{normalize_email, Credentials, PasswordReset, ProfileUpdate, Registration};
use shopbill_core::{Account, Profile, ValidationError};
use tracing::{info, warn};

use crate::auth::{hash_password, verify_password, CurrentUser};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user: Account,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: Account,
    pub access: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

#[derive(Debug, Deserialize)]
pub struct CheckEmailRequest {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckEmailResponse {
    pub exists: bool,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// `POST /register`
pub async fn register(
    State(state): State<AppState>,
    Json(mut registration): Json<Registration>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    registration.validate()?;

    let hash = hash_password(&registration.password)?;
    let user = state.db.accounts().create(registration, &hash).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully",
            user,
        }),
    ))
}

/// `POST /login`
pub async fn login(
    State(state): State<AppState>,
    Json(mut credentials): Json<Credentials>,
) -> ApiResult<Json<LoginResponse>> {
    credentials.validate()?;

    let rejected = || ApiError::Unauthorized("invalid email or password".to_string());

    let Some((user, hash)) = state.db.accounts().credentials(&credentials.email).await? else {
        warn!(email = %credentials.email, "Login for unknown email");
        return Err(rejected());
    };

    if !verify_password(&credentials.password, &hash)? {
        warn!(user = %user.id, "Login with wrong password");
        return Err(rejected());
    }

    let access = state.jwt.issue(&user)?;
    info!(user = %user.id, "Logged in");

    Ok(Json(LoginResponse {
        user,
        access,
        token_type: "Bearer",
        expires_in: state.jwt.access_lifetime_secs(),
    }))
}

/// `POST /check-email`
pub async fn check_email(
    State(state): State<AppState>,
    Json(request): Json<CheckEmailRequest>,
) -> ApiResult<Json<CheckEmailResponse>> {
    let email = request
        .email
        .map(|e| normalize_email(&e))
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ValidationError::Required {
            field: "email".to_string(),
        })?;

    let exists = state.db.accounts().email_exists(&email).await?;
    Ok(Json(CheckEmailResponse { exists }))
}

/// `POST /forgot-password`: sets a new password for an existing email.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(mut reset): Json<PasswordReset>,
) -> ApiResult<Json<MessageResponse>> {
    reset.validate()?;

    let hash = hash_password(&reset.new_password)?;
    state.db.accounts().set_password(&reset.email, &hash).await?;

    Ok(Json(MessageResponse {
        message: "Password updated successfully",
    }))
}

/// `GET /user`
pub async fn get_profile(State(state): State<AppState>, user: CurrentUser) -> ApiResult<Json<Profile>> {
    let profile = state.db.accounts().profile(user.id()).await?;
    Ok(Json(profile))
}

/// `PUT /user`
pub async fn update_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<Json<Profile>> {
    let profile = state.db.accounts().update_profile(user.id(), update).await?;
    Ok(Json(profile))
}
