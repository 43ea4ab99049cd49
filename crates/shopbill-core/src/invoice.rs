//! # Invoice Math
//!
//! Per-line amounts and header rollup for sales.
//!
//! ## Derivation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Line (per SaleItem)                                                    │
//! │    taxable = sale_price × quantity                                      │
//! │    tax     = round_half_up(taxable × rate_bps / 10000)                  │
//! │    total   = taxable + tax                                              │
//! │                                                                         │
//! │  Header (per Sale)                                                      │
//! │    taxable = Σ line.taxable                                             │
//! │    tax     = Σ line.tax                                                 │
//! │    total   = taxable + tax − discount                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Tax is rounded once per line, then summed. Header totals are never taken
//! from the client. Every step is checked: an amount that does not fit in
//! i64 paise is a validation error, not a wrapped number.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{default_true, PaymentMethod, SaleItem, TaxRate};
use crate::validation::{validate_non_negative, validate_quantity, ValidationResult};

// =============================================================================
// Line Amounts
// =============================================================================

/// The three derived amounts of one sale line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineAmounts {
    pub taxable: Money,
    pub tax: Money,
    pub total: Money,
}

impl LineAmounts {
    /// Computes a line from its snapshots.
    ///
    /// ## Example
    /// ```rust
    /// use shopbill_core::invoice::LineAmounts;
    /// use shopbill_core::money::Money;
    /// use shopbill_core::types::TaxRate;
    ///
    /// let line = LineAmounts::compute(Money::from_cents(10000), 3, TaxRate::from_bps(1800)).unwrap();
    /// assert_eq!(line.taxable.cents(), 30000);
    /// assert_eq!(line.tax.cents(), 5400);
    /// assert_eq!(line.total.cents(), 35400);
    /// ```
    pub fn compute(sale_price: Money, quantity: i64, rate: TaxRate) -> ValidationResult<LineAmounts> {
        let taxable = sale_price
            .multiply_quantity(quantity)
            .ok_or_else(|| too_large("taxable_amount"))?;
        let tax = taxable.calculate_tax(rate);
        let total = taxable.checked_add(tax).ok_or_else(|| too_large("total_amount"))?;
        Ok(LineAmounts { taxable, tax, total })
    }

    /// Recomputes the amounts stored on an item from its own snapshots.
    pub fn of_item(item: &SaleItem) -> ValidationResult<LineAmounts> {
        Self::compute(
            item.sale_price(),
            item.quantity,
            TaxRate::from_bps(item.tax_rate_bps),
        )
    }
}

// =============================================================================
// Sale Totals
// =============================================================================

/// Header aggregates of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleTotals {
    pub taxable: Money,
    pub tax: Money,
    pub discount: Money,
    pub total: Money,
}

impl SaleTotals {
    /// Sums `(taxable, tax)` pairs of stored lines and applies the discount.
    pub fn from_amounts<I>(lines: I, discount: Money) -> ValidationResult<SaleTotals>
    where
        I: IntoIterator<Item = (Money, Money)>,
    {
        let mut taxable = Money::zero();
        let mut tax = Money::zero();
        for (line_taxable, line_tax) in lines {
            taxable = taxable
                .checked_add(line_taxable)
                .ok_or_else(|| too_large("taxable_amount"))?;
            tax = tax.checked_add(line_tax).ok_or_else(|| too_large("tax_amount"))?;
        }

        let total = taxable
            .checked_add(tax)
            .and_then(|gross| gross.checked_sub(discount))
            .ok_or_else(|| too_large("total_amount"))?;

        Ok(SaleTotals {
            taxable,
            tax,
            discount,
            total,
        })
    }

    /// Rolls up a set of lines.
    ///
    /// A discount larger than the goods value yields a negative total.
    pub fn rollup<'a, I>(lines: I, discount: Money) -> ValidationResult<SaleTotals>
    where
        I: IntoIterator<Item = &'a LineAmounts>,
    {
        Self::from_amounts(lines.into_iter().map(|l| (l.taxable, l.tax)), discount)
    }
}

fn too_large(field: &str) -> ValidationError {
    ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "amount is too large".to_string(),
    }
}

// =============================================================================
// Sale Input
// =============================================================================

/// One requested line: which product, how many.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSaleLine {
    pub product_id: String,
    pub quantity: i64,
}

/// Request to create a sale. Carries no amounts except the discount.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSale {
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub customer_address: Option<String>,
    #[serde(default)]
    pub customer_gst: Option<String>,
    #[serde(default)]
    pub customer_state: Option<String>,
    #[serde(default)]
    pub customer_state_code: Option<String>,
    #[serde(default)]
    pub discount_cents: i64,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "default_true")]
    pub include_gst: bool,
    pub items: Vec<NewSaleLine>,
}

impl NewSale {
    /// Checks everything that can be checked without the catalog.
    pub fn validate(&self) -> ValidationResult<()> {
        if self.items.is_empty() {
            return Err(ValidationError::Required {
                field: "items".to_string(),
            });
        }

        for line in &self.items {
            if line.product_id.trim().is_empty() {
                return Err(ValidationError::Required {
                    field: "product_id".to_string(),
                });
            }
            validate_quantity(line.quantity)?;
        }

        validate_non_negative(self.discount_cents, "discount")
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
