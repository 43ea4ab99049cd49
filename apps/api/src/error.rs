//! Error types for the HTTP API.
//!
//! Every failure reaches the client as `{code, message, field?}` with a
//! matching status code:
//!
//! ```text
//! ValidationError          → 400 VALIDATION_ERROR (field set)
//! NotFound                 → 404 NOT_FOUND
//! UniqueViolation / FK     → 409 CONFLICT
//! InsufficientStock        → 422 INSUFFICIENT_STOCK
//! missing / bad token      → 401 UNAUTHORIZED
//! not an admin             → 403 FORBIDDEN
//! anything else            → 500 INTERNAL_ERROR (details only in the log)
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use shopbill_core::{CoreError, ValidationError};
use shopbill_db::DbError;

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Conflict {
        message: String,
        field: Option<String>,
    },

    #[error("{0}")]
    InsufficientStock(String),

    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Wire shape of an error.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::InsufficientStock(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict { .. } => "CONFLICT",
            ApiError::InsufficientStock(_) => "INSUFFICIENT_STOCK",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn body(&self) -> ErrorBody {
        let (message, field) = match self {
            ApiError::Validation(e) => (e.to_string(), Some(e.field().to_string())),
            ApiError::Conflict { message, field } => (message.clone(), field.clone()),
            ApiError::Internal(_) => ("Internal server error".to_string(), None),
            other => (other.to_string(), None),
        };
        ErrorBody {
            code: self.code(),
            message,
            field,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            tracing::error!(error = %detail, "Request failed");
        }
        (self.status(), Json(self.body())).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            DbError::UniqueViolation { ref field, .. } => ApiError::Conflict {
                field: Some(field.clone()),
                message: err.to_string(),
            },
            DbError::ForeignKeyViolation { message } => ApiError::Conflict {
                message,
                field: None,
            },
            DbError::Validation(v) => ApiError::Validation(v),
            DbError::Domain(core) => core.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(v) => ApiError::Validation(v),
            CoreError::InsufficientStock { .. } => ApiError::InsufficientStock(err.to_string()),
            CoreError::ProductNotFound(_) | CoreError::SaleNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_carries_field() {
        let err: ApiError = ValidationError::Required {
            field: "items".to_string(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let body = err.body();
        assert_eq!(body.code, "VALIDATION_ERROR");
        assert_eq!(body.field.as_deref(), Some("items"));
    }

    #[test]
    fn test_db_error_mapping() {
        let err: ApiError = DbError::not_found("Product", "p-1").into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err: ApiError = DbError::duplicate("email", "a@b.in").into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.body().field.as_deref(), Some("email"));

        let err: ApiError = DbError::ForeignKeyViolation {
            message: "product p-1 appears on existing sales".to_string(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_insufficient_stock_is_422() {
        let err: ApiError = CoreError::InsufficientStock {
            code: "PRD-0001".to_string(),
            available: 1,
            requested: 2,
        }
        .into();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_internal_detail_is_hidden() {
        let err = ApiError::Internal("disk I/O error".to_string());
        assert_eq!(err.body().message, "Internal server error");
    }
}
