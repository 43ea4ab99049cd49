//! # Domain Errors
//!
//! `ValidationError` names the offending field; `CoreError` covers rule
//! failures that are not about a single field. Both travel up unchanged:
//! `DbError` wraps them and `ApiError` turns them into a status code.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Unknown id, or a product of another shop.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Part of the taxonomy for callers that want a sufficiency check.
    /// Sale creation does not raise it: stock is debited unconditionally
    /// and may go negative.
    #[error("Insufficient stock for {code}: available {available}, requested {requested}")]
    InsufficientStock {
        code: String,
        available: i64,
        requested: i64,
    },

    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Rejected input, always tied to one field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Missing, empty, or blank after trimming.
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Zero or less where only > 0 makes sense (quantities).
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Unparseable: not a decimal, not a date, bad characters.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Password and its confirmation differ.
    #[error("{field} does not match")]
    Mismatch { field: String },
}

impl ValidationError {
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooShort { field, .. }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::Negative { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. }
            | ValidationError::Mismatch { field } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_shortfall_names_the_product() {
        let err = CoreError::InsufficientStock {
            code: "PRD-0007".to_string(),
            available: 0,
            requested: 2,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for PRD-0007: available 0, requested 2"
        );
    }

    #[test]
    fn test_messages_lead_with_the_field() {
        let missing = ValidationError::Required {
            field: "shop_name".to_string(),
        };
        let weak = ValidationError::TooShort {
            field: "password".to_string(),
            min: 8,
        };
        assert_eq!(missing.to_string(), "shop_name is required");
        assert_eq!(weak.to_string(), "password must be at least 8 characters");
        assert_eq!(weak.field(), "password");
    }

    #[test]
    fn test_empty_sale_is_a_validation_failure() {
        let err: CoreError = ValidationError::Required {
            field: "items".to_string(),
        }
        .into();
        match err {
            CoreError::Validation(inner) => assert_eq!(inner.field(), "items"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
