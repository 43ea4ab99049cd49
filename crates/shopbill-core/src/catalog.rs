//! # Catalog Rules
//!
//! Pure rules for products: expiry classification, expiry filters and the
//! formatting of sequence-allocated business identifiers.
//!
//! ## Expiry Classification
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  expiry_date relative to today        →  label                          │
//! │  ───────────────────────────────────     ────────────────────────────  │
//! │  none                                    "No expiry"                   │
//! │  date <  today                           "Expired"                     │
//! │  date == today                           "Expires Today"               │
//! │  today < date <= today + 7               "Expires in N days"           │
//! │  date >  today + 7                       "Valid Until YYYY-MM-DD"      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! "Today" is always a parameter; nothing here reads the clock.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::{default_true, deserialize_some, Product};
use crate::validation::{
    non_blank, validate_bps, validate_name, validate_non_negative, validate_product_code,
    ValidationResult,
};

/// Products expiring within this many days are "expiring soon".
pub const EXPIRY_WARNING_DAYS: i64 = 7;

// =============================================================================
// Expiry Status
// =============================================================================

/// Where a product sits relative to its expiry date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryStatus {
    NoExpiry,
    Expired,
    ExpiresToday,
    /// 1..=7 days left.
    ExpiresIn(i64),
    ValidUntil(NaiveDate),
}

impl ExpiryStatus {
    /// Classifies `expiry` against `today`.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::NaiveDate;
    /// use shopbill_core::catalog::ExpiryStatus;
    ///
    /// let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    /// let in_a_week = NaiveDate::from_ymd_opt(2024, 6, 8);
    /// assert_eq!(
    ///     ExpiryStatus::classify(in_a_week, today).to_string(),
    ///     "Expires in 7 days"
    /// );
    /// ```
    pub fn classify(expiry: Option<NaiveDate>, today: NaiveDate) -> ExpiryStatus {
        let Some(date) = expiry else {
            return ExpiryStatus::NoExpiry;
        };

        let days = (date - today).num_days();
        match days {
            d if d < 0 => ExpiryStatus::Expired,
            0 => ExpiryStatus::ExpiresToday,
            d if d <= EXPIRY_WARNING_DAYS => ExpiryStatus::ExpiresIn(d),
            _ => ExpiryStatus::ValidUntil(date),
        }
    }
}

impl fmt::Display for ExpiryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpiryStatus::NoExpiry => write!(f, "No expiry"),
            ExpiryStatus::Expired => write!(f, "Expired"),
            ExpiryStatus::ExpiresToday => write!(f, "Expires Today"),
            ExpiryStatus::ExpiresIn(days) => write!(f, "Expires in {} days", days),
            ExpiryStatus::ValidUntil(date) => write!(f, "Valid Until {}", date.format("%Y-%m-%d")),
        }
    }
}

/// Signed whole days from `today` to `expiry`; negative once expired.
pub fn days_to_expiry(expiry: Option<NaiveDate>, today: NaiveDate) -> Option<i64> {
    expiry.map(|date| (date - today).num_days())
}

// =============================================================================
// Expiry Filter
// =============================================================================

/// Listing filter on expiry date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryFilter {
    /// date < today
    Expired,
    /// today <= date <= today + 7
    ExpiringSoon,
}

impl ExpiryFilter {
    /// Inclusive date bounds `(from, to)` for a SQL range query.
    /// `None` means unbounded on that side.
    pub fn bounds(&self, today: NaiveDate) -> (Option<NaiveDate>, Option<NaiveDate>) {
        match self {
            ExpiryFilter::Expired => (None, today.pred_opt()),
            ExpiryFilter::ExpiringSoon => (
                Some(today),
                today.checked_add_signed(Duration::days(EXPIRY_WARNING_DAYS)),
            ),
        }
    }

    /// Whether a product with `expiry` passes this filter.
    pub fn matches(&self, expiry: Option<NaiveDate>, today: NaiveDate) -> bool {
        let Some(date) = expiry else {
            return false;
        };
        let (from, to) = self.bounds(today);
        from.map_or(true, |f| date >= f) && to.map_or(true, |t| date <= t)
    }
}

impl FromStr for ExpiryFilter {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "expired" => Ok(ExpiryFilter::Expired),
            "expiring_soon" => Ok(ExpiryFilter::ExpiringSoon),
            _ => Err(ValidationError::NotAllowed {
                field: "expiry_filter".to_string(),
                allowed: vec!["expired".to_string(), "expiring_soon".to_string()],
            }),
        }
    }
}

// =============================================================================
// Sequences
// =============================================================================

/// A named counter used to mint business identifiers.
///
/// ```text
/// product_code   : 1 → "PRD-0001"     12345 → "PRD-12345"
/// invoice_number : 1 → "INV-00001"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceKind {
    ProductCode,
    InvoiceNumber,
}

impl SequenceKind {
    /// Row name in the `sequences` table.
    pub const fn name(&self) -> &'static str {
        match self {
            SequenceKind::ProductCode => "product_code",
            SequenceKind::InvoiceNumber => "invoice_number",
        }
    }

    /// Formats an allocated value. Values wider than the pad are printed in full.
    pub fn format(&self, value: i64) -> String {
        match self {
            SequenceKind::ProductCode => format!("PRD-{:04}", value),
            SequenceKind::InvoiceNumber => format!("INV-{:05}", value),
        }
    }
}

// =============================================================================
// Product Input
// =============================================================================

/// A product to create. `product_code` is allocated when absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    #[serde(default)]
    pub product_code: Option<String>,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    pub purchase_price_cents: i64,
    pub selling_price_cents: i64,
    #[serde(default)]
    pub stock_quantity: i64,
    #[serde(default)]
    pub min_stock_level: i64,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub tax_rate_bps: u32,
    #[serde(default)]
    pub discount_bps: u32,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub supplier: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl NewProduct {
    /// Validates and normalizes free text in place.
    pub fn validate(&mut self) -> ValidationResult<()> {
        self.product_code = non_blank(self.product_code.take());
        if let Some(code) = &self.product_code {
            validate_product_code(code)?;
        }
        self.name = self.name.trim().to_string();
        validate_name(&self.name, "name")?;
        validate_non_negative(self.purchase_price_cents, "purchase_price")?;
        validate_non_negative(self.selling_price_cents, "selling_price")?;
        validate_non_negative(self.stock_quantity, "stock_quantity")?;
        validate_non_negative(self.min_stock_level, "min_stock_level")?;
        validate_bps(self.tax_rate_bps, "tax_rate")?;
        validate_bps(self.discount_bps, "discount")?;

        self.category = non_blank(self.category.take());
        self.unit = non_blank(self.unit.take());
        self.barcode = non_blank(self.barcode.take());
        self.manufacturer = non_blank(self.manufacturer.take());
        self.supplier = non_blank(self.supplier.take());
        self.description = non_blank(self.description.take());
        Ok(())
    }

    /// Builds the row to insert once a code is known.
    pub fn into_product(
        self,
        id: String,
        owner_id: String,
        product_code: String,
        now: DateTime<Utc>,
    ) -> Product {
        Product {
            id,
            owner_id,
            product_code,
            name: self.name,
            category: self.category,
            unit: self.unit,
            purchase_price_cents: self.purchase_price_cents,
            selling_price_cents: self.selling_price_cents,
            stock_quantity: self.stock_quantity,
            min_stock_level: self.min_stock_level,
            barcode: self.barcode,
            tax_rate_bps: self.tax_rate_bps,
            discount_bps: self.discount_bps,
            expiry_date: self.expiry_date,
            manufacturer: self.manufacturer,
            supplier: self.supplier,
            description: self.description,
            is_active: self.is_active,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Changes to an existing product. Absent fields are left alone.
///
/// The product code is not part of the update: once assigned it never
/// changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub purchase_price_cents: Option<i64>,
    pub selling_price_cents: Option<i64>,
    pub stock_quantity: Option<i64>,
    pub min_stock_level: Option<i64>,
    pub barcode: Option<String>,
    pub tax_rate_bps: Option<u32>,
    pub discount_bps: Option<u32>,
    /// `null` clears the date.
    #[serde(default, deserialize_with = "deserialize_some")]
    #[ts(as = "Option<Option<String>>")]
    pub expiry_date: Option<Option<NaiveDate>>,
    pub manufacturer: Option<String>,
    pub supplier: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

impl ProductUpdate {
    /// Applies the changes and re-validates the result.
    ///
    /// Stock is only checked when the update sets it: sales may have
    /// driven the stored count negative, and that must not block a rename.
    pub fn apply(self, product: &mut Product, now: DateTime<Utc>) -> ValidationResult<()> {
        if let Some(name) = self.name {
            product.name = name.trim().to_string();
        }
        if self.category.is_some() {
            product.category = non_blank(self.category);
        }
        if self.unit.is_some() {
            product.unit = non_blank(self.unit);
        }
        if let Some(v) = self.purchase_price_cents {
            product.purchase_price_cents = v;
        }
        if let Some(v) = self.selling_price_cents {
            product.selling_price_cents = v;
        }
        if let Some(v) = self.stock_quantity {
            validate_non_negative(v, "stock_quantity")?;
            product.stock_quantity = v;
        }
        if let Some(v) = self.min_stock_level {
            product.min_stock_level = v;
        }
        if self.barcode.is_some() {
            product.barcode = non_blank(self.barcode);
        }
        if let Some(v) = self.tax_rate_bps {
            product.tax_rate_bps = v;
        }
        if let Some(v) = self.discount_bps {
            product.discount_bps = v;
        }
        if let Some(expiry) = self.expiry_date {
            product.expiry_date = expiry;
        }
        if self.manufacturer.is_some() {
            product.manufacturer = non_blank(self.manufacturer);
        }
        if self.supplier.is_some() {
            product.supplier = non_blank(self.supplier);
        }
        if self.description.is_some() {
            product.description = non_blank(self.description);
        }
        if let Some(v) = self.is_active {
            product.is_active = v;
        }
        product.updated_at = now;

        validate_name(&product.name, "name")?;
        validate_non_negative(product.purchase_price_cents, "purchase_price")?;
        validate_non_negative(product.selling_price_cents, "selling_price")?;
        validate_non_negative(product.min_stock_level, "min_stock_level")?;
        validate_bps(product.tax_rate_bps, "tax_rate")?;
        validate_bps(product.discount_bps, "discount")
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
