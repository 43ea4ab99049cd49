//! Liveness and database reachability.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    /// `current`, `behind`, or `unknown` when the database is unreachable.
    pub schema: &'static str,
    pub version: &'static str,
}

/// `GET /health`: 200 when the database answers, 503 otherwise.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let db_ok = state.db.health_check().await;

    let (code, status, database) = if db_ok {
        (StatusCode::OK, "ok", "ok")
    } else {
        tracing::warn!("Health check: database unreachable");
        (StatusCode::SERVICE_UNAVAILABLE, "degraded", "unreachable")
    };

    let schema = match state.db.migration_status().await {
        Ok(m) if m.is_current() => "current",
        Ok(_) => "behind",
        Err(_) => "unknown",
    };

    (
        code,
        Json(HealthResponse {
            status,
            database,
            schema,
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}
