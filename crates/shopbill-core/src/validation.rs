//! # Validation Module
//!
//! Input validation utilities for Shopbill.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (apps/api)                                      │
//! │  ├── Type validation (JSON deserialization)                            │
//! │  └── Auth / ownership                                                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE: Business rule validation                        │
//! │  └── Lengths, ranges, password rules, ticket feedback rule             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE constraints (email, product_code, invoice_number)          │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shopbill_core::validation::{validate_name, validate_quantity};
//!
//! validate_name("Basmati Rice 1kg", "name").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Minimum password length for accounts.
pub const MIN_PASSWORD_LEN: usize = 8;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required display name.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 255 characters
pub fn validate_name(name: &str, field: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > 255 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 255,
        });
    }

    Ok(())
}

/// Validates a user-supplied product code.
///
/// Letters, digits, hyphens and underscores, at most 50 characters.
pub fn validate_product_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "product_code".to_string(),
        });
    }

    if code.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "product_code".to_string(),
            max: 50,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "product_code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Loose e-mail check: one `@` with something on both sides and a dot in
/// the domain.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must be a valid email address".to_string(),
        });
    }

    Ok(())
}

/// Validates a new password and its confirmation.
pub fn validate_new_password(password: &str, confirm: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LEN,
        });
    }

    if password != confirm {
        return Err(ValidationError::Mismatch {
            field: "confirm_password".to_string(),
        });
    }

    Ok(())
}

/// Validates a search query; returns it trimmed.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Trims optional free text; blank becomes `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Largest quantity accepted on one sale line.
pub const MAX_QUANTITY: i64 = 1_000_000;

/// Validates a sale line quantity.
///
/// ## User Workflow
/// ```text
/// POST /sales  { items: [{ product_id, quantity: 0 }] }
///      │
///      ▼
/// validate_quantity(0) ← THIS FUNCTION
///      │
///      ├── qty <= 0?            → 400 "quantity must be positive"
///      └── qty > MAX_QUANTITY?  → 400 "quantity must be between 1 and 1000000"
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    if qty > MAX_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_QUANTITY,
        });
    }

    Ok(())
}

/// Rejects negative amounts and counts.
///
/// ## Example
/// ```rust
/// use shopbill_core::validation::validate_non_negative;
///
/// assert!(validate_non_negative(0, "stock_quantity").is_ok());
/// assert!(validate_non_negative(-1, "stock_quantity").is_err());
/// ```
pub fn validate_non_negative(value: i64, field: &str) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a percentage in basis points (0..=100%).
pub fn validate_bps(bps: u32, field: &str) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

/// Ticket priority: 1 (lowest) ..= 5 (highest).
pub fn validate_priority(priority: i64) -> ValidationResult<()> {
    if !(1..=5).contains(&priority) {
        return Err(ValidationError::OutOfRange {
            field: "priority".to_string(),
            min: 1,
            max: 5,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Basmati Rice", "name").is_ok());
        assert!(validate_name("   ", "name").is_err());
        assert!(validate_name(&"A".repeat(300), "name").is_err());
    }

    #[test]
    fn test_validate_product_code() {
        assert!(validate_product_code("PRD-0001").is_ok());
        assert!(validate_product_code("rice_1kg").is_ok());

        assert!(validate_product_code("").is_err());
        assert!(validate_product_code("has space").is_err());
        assert!(validate_product_code(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("owner@shop.in").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("owner").is_err());
        assert!(validate_email("@shop.in").is_err());
        assert!(validate_email("owner@shop").is_err());
    }

    #[test]
    fn test_validate_new_password() {
        assert!(validate_new_password("s3cretpass", "s3cretpass").is_ok());
        assert!(matches!(
            validate_new_password("short", "short"),
            Err(ValidationError::TooShort { .. })
        ));
        assert!(matches!(
            validate_new_password("s3cretpass", "s3cretpasz"),
            Err(ValidationError::Mismatch { .. })
        ));
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  Grocery ".to_string())), Some("Grocery".to_string()));
        assert_eq!(non_blank(Some("   ".to_string())), None);
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(10_000).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(MAX_QUANTITY).is_ok());
        assert!(matches!(
            validate_quantity(i64::MAX / 1000),
            Err(ValidationError::OutOfRange { max: MAX_QUANTITY, .. })
        ));
    }

    #[test]
    fn test_validate_bps() {
        assert!(validate_bps(0, "tax_rate").is_ok());
        assert!(validate_bps(10000, "tax_rate").is_ok());
        assert!(validate_bps(10001, "tax_rate").is_err());
    }

    #[test]
    fn test_validate_priority() {
        assert!(validate_priority(1).is_ok());
        assert!(validate_priority(5).is_ok());
        assert!(validate_priority(0).is_err());
        assert!(validate_priority(6).is_err());
    }
}
