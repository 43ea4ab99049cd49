//! # Directory Types
//!
//! Customers, vendors, bill settings and support tickets. These are plain
//! owner-scoped records; the only rules are defaults, enum domains and the
//! ticket feedback rule.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::{PaymentMethod, TaxRate};
use crate::validation::{non_blank, validate_bps, validate_name, validate_priority, ValidationResult};

// =============================================================================
// Shared Status
// =============================================================================

/// Active/inactive flag shared by customers and vendors.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    #[default]
    Active,
    Inactive,
}

impl FromStr for RecordStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(RecordStatus::Active),
            "inactive" => Ok(RecordStatus::Inactive),
            _ => Err(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: vec!["active".to_string(), "inactive".to_string()],
            }),
        }
    }
}

// =============================================================================
// Customer
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum CustomerType {
    #[default]
    Retail,
    Wholesale,
    Business,
}

/// A customer of a shop. Listed newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    pub customer_type: CustomerType,
    pub tax_id: Option<String>,
    pub notes: Option<String>,
    pub status: RecordStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Body of customer create and replace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerInput {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub customer_type: CustomerType,
    #[serde(default)]
    pub tax_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: RecordStatus,
}

impl CustomerInput {
    pub fn validate(&mut self) -> ValidationResult<()> {
        self.name = self.name.trim().to_string();
        self.phone = self.phone.trim().to_string();
        validate_name(&self.name, "name")?;
        validate_name(&self.phone, "phone")?;
        self.email = non_blank(self.email.take());
        self.address = non_blank(self.address.take());
        self.city = non_blank(self.city.take());
        self.state = non_blank(self.state.take());
        self.zip = non_blank(self.zip.take());
        self.country = non_blank(self.country.take());
        self.tax_id = non_blank(self.tax_id.take());
        self.notes = non_blank(self.notes.take());
        Ok(())
    }
}

// =============================================================================
// Vendor
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum VendorType {
    #[default]
    Supplier,
    Manufacturer,
    Distributor,
}

/// A supplier of a shop. Listed newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Vendor {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub country: String,
    pub vendor_type: VendorType,
    pub tax_id: Option<String>,
    pub account_number: Option<String>,
    pub ifsc_code: Option<String>,
    pub notes: Option<String>,
    pub status: RecordStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

fn default_country() -> String {
    "India".to_string()
}

/// Body of vendor create and replace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VendorInput {
    pub name: String,
    #[serde(default)]
    pub contact_person: Option<String>,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default)]
    pub vendor_type: VendorType,
    #[serde(default)]
    pub tax_id: Option<String>,
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub ifsc_code: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: RecordStatus,
}

impl VendorInput {
    pub fn validate(&mut self) -> ValidationResult<()> {
        self.name = self.name.trim().to_string();
        self.phone = self.phone.trim().to_string();
        validate_name(&self.name, "name")?;
        validate_name(&self.phone, "phone")?;
        if self.country.trim().is_empty() {
            self.country = default_country();
        }
        self.contact_person = non_blank(self.contact_person.take());
        self.email = non_blank(self.email.take());
        self.address = non_blank(self.address.take());
        self.city = non_blank(self.city.take());
        self.state = non_blank(self.state.take());
        self.zip = non_blank(self.zip.take());
        self.tax_id = non_blank(self.tax_id.take());
        self.account_number = non_blank(self.account_number.take());
        self.ifsc_code = non_blank(self.ifsc_code.take());
        self.notes = non_blank(self.notes.take());
        Ok(())
    }
}

// =============================================================================
// Bill Settings
// =============================================================================

/// Whether printed prices include tax.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum TaxType {
    #[default]
    Inclusive,
    Exclusive,
}

/// Per-owner invoice template settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct BillSettings {
    pub owner_id: String,
    pub header: String,
    pub subheader: String,
    pub footer: String,
    pub tax_enabled: bool,
    pub tax_rate_bps: u32,
    pub discount_enabled: bool,
    pub print_automatically: bool,
    pub show_logo: bool,
    /// Reference to an externally stored logo.
    pub logo: Option<String>,
    pub show_signature: bool,
    pub signature: Option<String>,
    pub gst_number: String,
    pub upi_id: String,
    pub terms_and_conditions: String,
    pub show_customer_details: bool,
    pub default_payment_method: PaymentMethod,
    pub default_currency: String,
    pub default_category: String,
    pub default_unit: String,
    pub default_gst_rate: String,
    pub tax_type_on_sale: TaxType,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl BillSettings {
    /// Settings created on first access.
    pub fn defaults(owner_id: String, now: DateTime<Utc>) -> BillSettings {
        BillSettings {
            owner_id,
            header: "Your Business Name".to_string(),
            subheader: "Your Business Slogan".to_string(),
            footer: "Thank you for your business!".to_string(),
            tax_enabled: true,
            tax_rate_bps: 1800,
            discount_enabled: false,
            print_automatically: false,
            show_logo: true,
            logo: None,
            show_signature: true,
            signature: None,
            gst_number: String::new(),
            upi_id: String::new(),
            terms_and_conditions: "Goods once sold will not be taken back.".to_string(),
            show_customer_details: true,
            default_payment_method: PaymentMethod::Cash,
            default_currency: "INR".to_string(),
            default_category: String::new(),
            default_unit: String::new(),
            default_gst_rate: "18".to_string(),
            tax_type_on_sale: TaxType::Inclusive,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }
}

/// Changes to bill settings. Used for both PUT and PATCH; absent fields
/// keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BillSettingsUpdate {
    pub header: Option<String>,
    pub subheader: Option<String>,
    pub footer: Option<String>,
    pub tax_enabled: Option<bool>,
    pub tax_rate_bps: Option<u32>,
    pub discount_enabled: Option<bool>,
    pub print_automatically: Option<bool>,
    pub show_logo: Option<bool>,
    pub logo: Option<String>,
    pub show_signature: Option<bool>,
    pub signature: Option<String>,
    pub gst_number: Option<String>,
    pub upi_id: Option<String>,
    pub terms_and_conditions: Option<String>,
    pub show_customer_details: Option<bool>,
    pub default_payment_method: Option<PaymentMethod>,
    pub default_currency: Option<String>,
    pub default_category: Option<String>,
    pub default_unit: Option<String>,
    pub default_gst_rate: Option<String>,
    pub tax_type_on_sale: Option<TaxType>,
}

impl BillSettingsUpdate {
    pub fn apply(self, settings: &mut BillSettings, now: DateTime<Utc>) -> ValidationResult<()> {
        macro_rules! set {
            ($($field:ident),* $(,)?) => {
                $(if let Some(v) = self.$field {
                    settings.$field = v;
                })*
            };
        }

        set!(
            header,
            subheader,
            footer,
            tax_enabled,
            tax_rate_bps,
            discount_enabled,
            print_automatically,
            show_logo,
            show_signature,
            gst_number,
            upi_id,
            terms_and_conditions,
            show_customer_details,
            default_payment_method,
            default_currency,
            default_category,
            default_unit,
            default_gst_rate,
            tax_type_on_sale,
        );
        if self.logo.is_some() {
            settings.logo = non_blank(self.logo);
        }
        if self.signature.is_some() {
            settings.signature = non_blank(self.signature);
        }
        settings.updated_at = now;

        validate_bps(settings.tax_rate_bps, "tax_rate")?;
        if settings.default_currency.chars().count() != 3 {
            return Err(ValidationError::InvalidFormat {
                field: "default_currency".to_string(),
                reason: "must be a 3-letter currency code".to_string(),
            });
        }
        TaxRate::parse_percentage_field(&settings.default_gst_rate, "default_gst_rate")?;
        Ok(())
    }
}

// =============================================================================
// Tickets
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum TicketStatus {
    #[default]
    Open,
    #[serde(rename = "In Progress")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "In Progress"))]
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    /// Resolved and Closed need an explanation for the owner.
    pub fn requires_feedback(&self) -> bool {
        matches!(self, TicketStatus::Resolved | TicketStatus::Closed)
    }
}

/// A support request raised by a shop owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Ticket {
    pub id: String,
    pub owner_id: String,
    pub subject: String,
    pub description: String,
    pub status: TicketStatus,
    /// 1 (lowest) ..= 5 (highest)
    pub priority: i64,
    pub admin_feedback: Option<String>,
    #[ts(as = "Option<String>")]
    pub feedback_date: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A ticket with its attachment references.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct TicketWithAttachments {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub attachments: Vec<String>,
}

fn default_priority() -> i64 {
    3
}

/// Body of ticket creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewTicket {
    pub subject: String,
    pub description: String,
    #[serde(default = "default_priority")]
    pub priority: i64,
    /// References to externally stored files.
    #[serde(default)]
    pub attachments: Vec<String>,
}

impl NewTicket {
    pub fn validate(&mut self) -> ValidationResult<()> {
        self.subject = self.subject.trim().to_string();
        validate_name(&self.subject, "subject")?;
        if self.subject.chars().count() > 200 {
            return Err(ValidationError::TooLong {
                field: "subject".to_string(),
                max: 200,
            });
        }
        if self.description.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "description".to_string(),
            });
        }
        validate_priority(self.priority)?;
        self.attachments.retain(|a| !a.trim().is_empty());
        Ok(())
    }
}

/// Admin response to a ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TicketFeedback {
    pub status: TicketStatus,
    #[serde(default)]
    pub admin_feedback: Option<String>,
}

impl TicketFeedback {
    /// Applies feedback to a ticket.
    ///
    /// Resolving or closing without feedback is rejected. `feedback_date`
    /// is stamped when feedback first appears and cleared with it.
    pub fn apply(self, ticket: &mut Ticket, now: DateTime<Utc>) -> ValidationResult<()> {
        let feedback = non_blank(self.admin_feedback);

        if self.status.requires_feedback() && feedback.is_none() {
            return Err(ValidationError::Required {
                field: "admin_feedback".to_string(),
            });
        }

        ticket.feedback_date = match (&feedback, ticket.feedback_date) {
            (None, _) => None,
            (Some(_), Some(existing)) => Some(existing),
            (Some(_), None) => Some(now),
        };
        ticket.admin_feedback = feedback;
        ticket.status = self.status;
        ticket.updated_at = now;
        Ok(())
    }
}

/// Body of `set_status` on a customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StatusChange {
    pub status: RecordStatus,
    #[serde(default)]
    pub reason: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap()
    }

    fn ticket() -> Ticket {
        Ticket {
            id: "t1".to_string(),
            owner_id: "u1".to_string(),
            subject: "Printer".to_string(),
            description: "Invoice does not print".to_string(),
            status: TicketStatus::Open,
            priority: 3,
            admin_feedback: None,
            feedback_date: None,
            created_at: now(),
            updated_at: now(),
        }
    }

    #[test]
    fn test_bill_settings_defaults() {
        let s = BillSettings::defaults("u1".to_string(), now());
        assert_eq!(s.header, "Your Business Name");
        assert_eq!(s.tax_rate_bps, 1800);
        assert!(s.tax_enabled);
        assert!(!s.discount_enabled);
        assert_eq!(s.default_currency, "INR");
        assert_eq!(s.default_gst_rate, "18");
        assert_eq!(s.tax_type_on_sale, TaxType::Inclusive);
        assert_eq!(s.default_payment_method, PaymentMethod::Cash);
    }

    #[test]
    fn test_bill_settings_partial_update() {
        let mut s = BillSettings::defaults("u1".to_string(), now());
        let update: BillSettingsUpdate =
            serde_json::from_str(r#"{"footer":"Visit again","tax_rate_bps":500}"#).unwrap();
        update.apply(&mut s, now()).unwrap();
        assert_eq!(s.footer, "Visit again");
        assert_eq!(s.tax_rate_bps, 500);
        assert_eq!(s.header, "Your Business Name");
    }

    #[test]
    fn test_bill_settings_rejects_bad_currency() {
        let mut s = BillSettings::defaults("u1".to_string(), now());
        let update = BillSettingsUpdate {
            default_currency: Some("RUPEE".to_string()),
            ..BillSettingsUpdate::default()
        };
        assert!(update.apply(&mut s, now()).is_err());
    }

    #[test]
    fn test_ticket_status_serde() {
        assert_eq!(
            serde_json::to_string(&TicketStatus::InProgress).unwrap(),
            "\"In Progress\""
        );
    }

    #[test]
    fn test_resolve_requires_feedback() {
        let mut t = ticket();
        let feedback = TicketFeedback {
            status: TicketStatus::Resolved,
            admin_feedback: Some("   ".to_string()),
        };
        assert!(matches!(
            feedback.apply(&mut t, now()),
            Err(ValidationError::Required { field }) if field == "admin_feedback"
        ));
        assert_eq!(t.status, TicketStatus::Open);
    }

    #[test]
    fn test_feedback_date_set_once_and_cleared() {
        let mut t = ticket();
        TicketFeedback {
            status: TicketStatus::InProgress,
            admin_feedback: Some("Looking into it".to_string()),
        }
        .apply(&mut t, now())
        .unwrap();
        assert_eq!(t.feedback_date, Some(now()));

        let later = now() + Duration::hours(2);
        TicketFeedback {
            status: TicketStatus::Resolved,
            admin_feedback: Some("Driver updated".to_string()),
        }
        .apply(&mut t, later)
        .unwrap();
        assert_eq!(t.feedback_date, Some(now()));
        assert_eq!(t.status, TicketStatus::Resolved);

        TicketFeedback {
            status: TicketStatus::Open,
            admin_feedback: None,
        }
        .apply(&mut t, later)
        .unwrap();
        assert_eq!(t.feedback_date, None);
        assert_eq!(t.admin_feedback, None);
    }

    #[test]
    fn test_new_ticket_validation() {
        let mut t: NewTicket =
            serde_json::from_str(r#"{"subject":"Login","description":"Cannot log in"}"#).unwrap();
        assert_eq!(t.priority, 3);
        assert!(t.validate().is_ok());

        t.priority = 9;
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_vendor_country_defaults_to_india() {
        let mut v: VendorInput =
            serde_json::from_str(r#"{"name":"Agro Traders","phone":"9800000000"}"#).unwrap();
        v.validate().unwrap();
        assert_eq!(v.country, "India");
        assert_eq!(v.vendor_type, VendorType::Supplier);
    }

    #[test]
    fn test_record_status_from_str() {
        assert_eq!("inactive".parse::<RecordStatus>().unwrap(), RecordStatus::Inactive);
        assert!("paused".parse::<RecordStatus>().is_err());
    }
}
