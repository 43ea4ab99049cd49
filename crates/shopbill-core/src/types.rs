//! # Domain Types
//!
//! Core domain types used throughout Shopbill.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    SaleItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  sale_id (FK)   │       │
//! │  │  product_code   │   │  invoice_number │   │  product_id(FK) │       │
//! │  │  selling_price  │   │  taxable / tax  │   │  price snapshot │       │
//! │  │  stock_quantity │   │  total_cents    │   │  rate snapshot  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Account      │   │      Plan       │   │UserSubscription │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  email (login)  │   │  price_cents    │   │  start / end    │       │
//! │  │  plan_status    │   │  duration_min   │   │  status         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Products and sales carry:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (`product_code`, `invoice_number`) - human-readable,
//!   allocated from a sequence and never changed afterwards
//!
//! Customers, vendors, bill settings and tickets live in [`crate::directory`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

use crate::catalog::{days_to_expiry, ExpiryStatus};
use crate::error::ValidationError;
use crate::money::{parse_scaled, Money};

pub(crate) fn default_true() -> bool {
    true
}

/// Distinguishes an absent field from an explicit `null` in updates.
pub(crate) fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

// =============================================================================
// Tax Rate
// =============================================================================

/// A percentage represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1800 bps = 18% (standard GST slab)
///
/// Also used for product discounts, which share the same 2-decimal scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Upper bound: 100%.
    pub const MAX_BPS: u32 = 10_000;

    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Parses a percentage string (`"18"`, `"12.5"`, `"8.255"`).
    ///
    /// Rounded half-up to 2 decimal places; must lie in 0..=100.
    ///
    /// ## Example
    /// ```rust
    /// use shopbill_core::types::TaxRate;
    ///
    /// assert_eq!(TaxRate::parse_percentage("18").unwrap().bps(), 1800);
    /// assert_eq!(TaxRate::parse_percentage("8.255").unwrap().bps(), 826);
    /// assert!(TaxRate::parse_percentage("120").is_err());
    /// ```
    pub fn parse_percentage(input: &str) -> Result<TaxRate, ValidationError> {
        Self::parse_percentage_field(input, "tax_rate")
    }

    /// Like [`TaxRate::parse_percentage`], reporting errors against `field`.
    pub fn parse_percentage_field(input: &str, field: &str) -> Result<TaxRate, ValidationError> {
        let bps = parse_scaled(input, field, 100)?;
        if !(0..=Self::MAX_BPS as i64).contains(&bps) {
            return Err(ValidationError::OutOfRange {
                field: field.to_string(),
                min: 0,
                max: 100,
            });
        }
        Ok(TaxRate(bps as u32))
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

/// Renders as a percentage without trailing zeros (`"18"`, `"8.25"`, `"12.5"`).
impl std::fmt::Display for TaxRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let whole = self.0 / 100;
        let frac = self.0 % 100;
        match frac {
            0 => write!(f, "{}", whole),
            f2 if f2 % 10 == 0 => write!(f, "{}.{}", whole, f2 / 10),
            f2 => write!(f, "{}.{:02}", whole, f2),
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product in a shop's catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Account that owns this product.
    pub owner_id: String,

    /// Business identifier, `PRD-0001` style when system-assigned.
    pub product_code: String,

    /// Display name shown on invoices.
    pub name: String,

    pub category: Option<String>,
    pub unit: Option<String>,

    /// Purchase (cost) price in cents.
    pub purchase_price_cents: i64,

    /// Selling price in cents; snapshotted onto sale items.
    pub selling_price_cents: i64,

    /// Current stock. Only sale creation decrements it, and it may go
    /// negative when more is sold than is on hand.
    pub stock_quantity: i64,

    pub min_stock_level: i64,
    pub barcode: Option<String>,

    /// Tax rate in basis points (1800 = 18%).
    pub tax_rate_bps: u32,

    /// Catalog discount in basis points. Informational; not applied on sale.
    pub discount_bps: u32,

    #[ts(as = "Option<String>")]
    pub expiry_date: Option<NaiveDate>,

    pub manufacturer: Option<String>,
    pub supplier: Option<String>,
    pub description: Option<String>,

    /// Whether product is active.
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the selling price as a Money type.
    #[inline]
    pub fn selling_price(&self) -> Money {
        Money::from_cents(self.selling_price_cents)
    }

    /// Returns the tax rate.
    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }

    /// True once stock has fallen to the configured minimum.
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.min_stock_level
    }

    /// Attaches the fields derived from `today`.
    pub fn into_view(self, today: NaiveDate) -> ProductView {
        ProductView {
            expiry_status: ExpiryStatus::classify(self.expiry_date, today).to_string(),
            days_to_expiry: days_to_expiry(self.expiry_date, today),
            low_stock: self.is_low_stock(),
            product: self,
        }
    }
}

/// A product as returned to clients, with read-time derived fields.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub expiry_status: String,
    pub days_to_expiry: Option<i64>,
    pub low_stock: bool,
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Upi,
    Other,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

// =============================================================================
// Sale
// =============================================================================

/// An invoice header. Aggregates are always derived from the items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub owner_id: String,
    /// `INV-00001` style, allocated at creation.
    pub invoice_number: String,
    #[ts(as = "String")]
    pub sale_date: DateTime<Utc>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub customer_gst: Option<String>,
    pub customer_state: Option<String>,
    pub customer_state_code: Option<String>,
    pub discount_cents: i64,
    pub taxable_amount_cents: i64,
    pub tax_amount_cents: i64,
    /// taxable + tax − discount
    pub total_amount_cents: i64,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub include_gst: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub quantity: i64,
    /// Product name at time of sale (frozen).
    pub product_name: String,
    /// Unit price in cents at time of sale (frozen).
    pub sale_price_cents: i64,
    /// Tax rate at time of sale (frozen).
    pub tax_rate_bps: u32,
    /// sale_price × quantity
    pub taxable_amount_cents: i64,
    pub tax_amount_cents: i64,
    pub total_amount_cents: i64,
}

impl SaleItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn sale_price(&self) -> Money {
        Money::from_cents(self.sale_price_cents)
    }
}

/// A sale header together with its items.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct SaleWithItems {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

// =============================================================================
// Plans & Subscriptions
// =============================================================================

/// A purchasable subscription plan. Reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Plan {
    pub id: String,
    pub name: String,
    pub price_cents: i64,
    pub duration_minutes: i64,
}

/// Status of a single subscription record.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    /// Terminal for this record.
    Expired,
}

/// An owner's purchase of a plan for a time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct UserSubscription {
    pub id: String,
    pub owner_id: String,
    /// Null once the plan has been deleted.
    pub plan_id: Option<String>,
    #[ts(as = "String")]
    pub start_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub end_date: DateTime<Utc>,
    pub payment_id: Option<String>,
    pub status: SubscriptionStatus,
}

impl UserSubscription {
    /// Active while `now` has not passed the end date.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now <= self.end_date
    }
}

/// Cached per-account summary of the subscription state.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    Inactive,
    Active,
    Expired,
}

impl Default for PlanStatus {
    fn default() -> Self {
        PlanStatus::Inactive
    }
}

impl PlanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Inactive => "inactive",
            PlanStatus::Active => "active",
            PlanStatus::Expired => "expired",
        }
    }
}

// =============================================================================
// Account
// =============================================================================

/// A shop owner account. The password hash never leaves the db crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub username: String,
    pub shop_name: String,
    pub phone: String,
    pub gst_number: Option<String>,
    pub address: Option<String>,
    pub upi_id: Option<String>,
    /// Reference to an externally stored signature image.
    pub signature: Option<String>,
    pub show_customer_details: bool,
    pub print_automatically: bool,
    pub show_signature: bool,
    pub referred_by: Option<String>,
    pub is_admin: bool,
    pub plan_status: PlanStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Bank account printed on invoices. One per account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct BankDetails {
    pub bank_name: String,
    pub account_number: String,
    pub ifsc_code: String,
    pub branch: Option<String>,
}

/// One invoice term line; printed in `order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Term {
    pub term: String,
    pub order: i64,
}

/// An account with its bank details and terms.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct Profile {
    #[serde(flatten)]
    pub account: Account,
    pub bank_details: Option<BankDetails>,
    pub terms: Vec<Term>,
}

/// Everything an external renderer needs to print an invoice.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct InvoiceDocument {
    pub sale: SaleWithItems,
    pub shop: ShopProfile,
}

/// The seller block of an invoice.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct ShopProfile {
    pub shop_name: String,
    pub address: Option<String>,
    pub phone: String,
    pub email: String,
    pub gst_number: Option<String>,
    pub upi_id: Option<String>,
    pub signature: Option<String>,
    pub show_signature: bool,
    pub show_customer_details: bool,
    pub bank_details: Option<BankDetails>,
    pub terms: Vec<Term>,
}

impl From<Profile> for ShopProfile {
    fn from(profile: Profile) -> Self {
        let Profile {
            account,
            bank_details,
            terms,
        } = profile;
        ShopProfile {
            shop_name: account.shop_name,
            address: account.address,
            phone: account.phone,
            email: account.email,
            gst_number: account.gst_number,
            upi_id: account.upi_id,
            signature: account.signature,
            show_signature: account.show_signature,
            show_customer_details: account.show_customer_details,
            bank_details,
            terms,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn product(expiry: Option<NaiveDate>) -> Product {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        Product {
            id: "p1".to_string(),
            owner_id: "u1".to_string(),
            product_code: "PRD-0001".to_string(),
            name: "Basmati Rice 1kg".to_string(),
            category: Some("Grocery".to_string()),
            unit: Some("pkt".to_string()),
            purchase_price_cents: 8000,
            selling_price_cents: 10000,
            stock_quantity: 5,
            min_stock_level: 5,
            barcode: None,
            tax_rate_bps: 1800,
            discount_bps: 0,
            expiry_date: expiry,
            manufacturer: None,
            supplier: None,
            description: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_tax_rate_from_bps() {
        let rate = TaxRate::from_bps(825);
        assert_eq!(rate.bps(), 825);
        assert_eq!(rate.to_string(), "8.25");
    }

    #[test]
    fn test_tax_rate_display_trims_zeros() {
        assert_eq!(TaxRate::from_bps(1800).to_string(), "18");
        assert_eq!(TaxRate::from_bps(1250).to_string(), "12.5");
        assert_eq!(TaxRate::from_bps(5).to_string(), "0.05");
    }

    #[test]
    fn test_tax_rate_parse_percentage() {
        assert_eq!(TaxRate::parse_percentage("18.00").unwrap().bps(), 1800);
        assert_eq!(TaxRate::parse_percentage("0").unwrap().bps(), 0);
        assert_eq!(TaxRate::parse_percentage("100").unwrap().bps(), 10000);
        assert!(matches!(
            TaxRate::parse_percentage("-1"),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_product_view_derives_fields() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let view = product(NaiveDate::from_ymd_opt(2024, 6, 4)).into_view(today);
        assert_eq!(view.expiry_status, "Expires in 3 days");
        assert_eq!(view.days_to_expiry, Some(3));
        assert!(view.low_stock);

        let view = product(None).into_view(today);
        assert_eq!(view.expiry_status, "No expiry");
        assert_eq!(view.days_to_expiry, None);
    }

    #[test]
    fn test_product_view_serializes_flat() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let json = serde_json::to_value(product(None).into_view(today)).unwrap();
        assert_eq!(json["product_code"], "PRD-0001");
        assert_eq!(json["expiry_status"], "No expiry");
        assert_eq!(json["low_stock"], true);
    }

    #[test]
    fn test_payment_method_serde() {
        let json = serde_json::to_string(&PaymentMethod::Upi).unwrap();
        assert_eq!(json, "\"upi\"");
        assert_eq!(PaymentMethod::default(), PaymentMethod::Cash);
    }

    #[test]
    fn test_plan_status_default() {
        assert_eq!(PlanStatus::default(), PlanStatus::Inactive);
        assert_eq!(PlanStatus::Expired.as_str(), "expired");
    }
}
