//! Integer money for prices, line totals and invoice totals.
//!
//! Amounts are stored as `i64` paise. Rates are basis points, so a line's
//! tax is `taxable × bps / 10_000`, computed exactly and rounded half-up
//! once. Three units at 100.00 with 18% GST give 300.00 + 54.00 = 354.00.
//!
//! ## Decimal Input
//! Prices arrive as decimal strings from imports and forms ("100.00",
//! "49.995"). They are parsed exactly with `rust_decimal`, rounded half-up
//! to 2 places, then converted to integer cents. Floats never enter the
//! pipeline.
//!
//! ## Usage
//! ```rust
//! use shopbill_core::money::Money;
//!
//! let price = Money::from_cents(10000);          // 100.00
//! let line = price.multiply_quantity(3).unwrap(); // 300.00
//! let parsed = Money::parse_decimal("49.995").unwrap();
//! assert_eq!(parsed.cents(), 5000);              // rounded half-up
//! assert_eq!(line.to_string(), "300.00");
//! ```

use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// An amount in paise. Signed: a discount larger than the goods value
/// yields a negative sale total, which validation rejects upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Parses a decimal string such as `"100"`, `"100.5"` or `"49.995"`.
    ///
    /// The value is rounded half-up (away from zero) to 2 decimal places.
    /// Empty strings, garbage and values that overflow `i64` cents are
    /// rejected with a validation error naming `field`.
    ///
    /// ## Example
    /// ```rust
    /// use shopbill_core::money::Money;
    ///
    /// assert_eq!(Money::parse_decimal("100.00").unwrap().cents(), 10000);
    /// assert_eq!(Money::parse_decimal(" 0.005 ").unwrap().cents(), 1);
    /// assert!(Money::parse_decimal("ten").is_err());
    /// ```
    pub fn parse_decimal(input: &str) -> Result<Money, ValidationError> {
        Self::parse_decimal_field(input, "amount")
    }

    /// Like [`Money::parse_decimal`], reporting errors against `field`.
    pub fn parse_decimal_field(input: &str, field: &str) -> Result<Money, ValidationError> {
        let cents = parse_scaled(input, field, 100)?;
        Ok(Money(cents))
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (rupees) portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Calculates tax on a non-negative amount, rounding half-up.
    ///
    /// ## Implementation
    /// Integer math on basis points: `(amount × bps + 5000) / 10000`.
    /// The +5000 is half of the divisor, so any remainder of exactly one
    /// half rounds up. The intermediate is widened to i128 so large
    /// amounts cannot overflow.
    ///
    /// ## Example
    /// ```rust
    /// use shopbill_core::money::Money;
    /// use shopbill_core::types::TaxRate;
    ///
    /// let taxable = Money::from_cents(30000); // 300.00
    /// let rate = TaxRate::from_bps(1800);     // 18%
    /// assert_eq!(taxable.calculate_tax(rate).cents(), 5400); // 54.00
    ///
    /// // 10.00 × 8.25% = 0.825 → 0.83
    /// let tax = Money::from_cents(1000).calculate_tax(TaxRate::from_bps(825));
    /// assert_eq!(tax.cents(), 83);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        let tax_cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(tax_cents as i64)
    }

    /// Multiplies a unit price by a quantity, `None` on overflow.
    ///
    /// ```rust
    /// use shopbill_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.multiply_quantity(3), Some(Money::from_cents(897)));
    /// assert_eq!(Money::from_cents(i64::MAX).multiply_quantity(2), None);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Option<Money> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_sub(self, other: Money) -> Option<Money> {
        match self.0.checked_sub(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }
}

/// Parses a decimal string into an integer scaled by `scale` (100 for both
/// cents and basis points), rounding half away from zero at 2 places.
pub(crate) fn parse_scaled(input: &str, field: &str, scale: i64) -> Result<i64, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    let value = Decimal::from_str(trimmed).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a decimal number".to_string(),
    })?;

    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    rounded
        .checked_mul(Decimal::from(scale))
        .and_then(|scaled| scaled.trunc().to_i64())
        .ok_or_else(|| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "value is too large".to_string(),
        })
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Renders as a plain 2-decimal amount (`"354.00"`, `"-5.50"`).
///
/// Currency symbols belong to the bill template (see `BillSettings`).
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
