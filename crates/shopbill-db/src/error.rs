//! # Database Errors
//!
//! ```text
//! sqlx::Error ─┐
//! CoreError ───┼──► DbError ──► ApiError (status + {code, message, field})
//! Validation ──┘
//! ```
//!
//! SQLite reports constraint failures only as message text, so the
//! `From<sqlx::Error>` impl reads the message to tell a duplicate apart
//! from a foreign key refusal.

use shopbill_core::{CoreError, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// Missing, or owned by another account. Callers cannot tell which.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE column already holds `value`: a registered email, a taken
    /// product code, or a sequence value that kept colliding.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// A row is still referenced, e.g. a product that appears on a sale.
    #[error("Still referenced: {message}")]
    ForeignKeyViolation { message: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Domain rule failures without a storage meaning of their own.
    #[error(transparent)]
    Domain(CoreError),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Every pooled connection stayed busy past the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// True for a UNIQUE violation on the given column.
    pub fn is_unique_violation_on(&self, column: &str) -> bool {
        matches!(self, DbError::UniqueViolation { field, .. } if field == column)
    }
}

/// Column name out of `"UNIQUE constraint failed: products.product_code"`.
fn unique_column(message: &str) -> Option<&str> {
    message
        .strip_prefix("UNIQUE constraint failed: ")?
        .split(", ")
        .next()?
        .rsplit('.')
        .next()
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::Database(db_err) => {
                let message = db_err.message();
                if let Some(column) = unique_column(message) {
                    DbError::duplicate(column, "unknown")
                } else if message.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: message.to_string(),
                    }
                } else {
                    DbError::QueryFailed(message.to_string())
                }
            }
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<CoreError> for DbError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => DbError::not_found("Product", id),
            CoreError::SaleNotFound(id) => DbError::not_found("Sale", id),
            CoreError::Validation(v) => DbError::Validation(v),
            other => DbError::Domain(other),
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;
