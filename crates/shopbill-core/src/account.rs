//! # Account Inputs
//!
//! Registration and shop-profile changes. Password hashing and token
//! issuance happen in the API layer; this module only checks the shape.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::{Account, BankDetails, Term};
use crate::validation::{
    non_blank, validate_email, validate_name, validate_new_password, ValidationResult,
};

/// Body of `POST /register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Registration {
    pub email: String,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub shop_name: String,
    pub phone: String,
    #[serde(default)]
    pub gst_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub referred_by: Option<String>,
}

impl Registration {
    pub fn validate(&mut self) -> ValidationResult<()> {
        self.email = normalize_email(&self.email);
        validate_email(&self.email)?;
        self.username = self.username.trim().to_string();
        validate_name(&self.username, "username")?;
        validate_new_password(&self.password, &self.confirm_password)?;
        self.shop_name = self.shop_name.trim().to_string();
        validate_name(&self.shop_name, "shop_name")?;
        self.phone = self.phone.trim().to_string();
        validate_name(&self.phone, "phone")?;
        self.gst_number = non_blank(self.gst_number.take());
        self.address = non_blank(self.address.take());
        self.referred_by = non_blank(self.referred_by.take());
        Ok(())
    }
}

/// Emails are compared case-insensitively.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Body of `POST /forgot-password`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PasswordReset {
    pub email: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl PasswordReset {
    pub fn validate(&mut self) -> ValidationResult<()> {
        self.email = normalize_email(&self.email);
        validate_email(&self.email)?;
        validate_new_password(&self.new_password, &self.confirm_password)
    }
}

/// Body of `PUT /user`. Absent fields are left alone.
///
/// `bank_details` is upserted when present. `terms` replaces the whole list
/// when present, in the order given.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub shop_name: Option<String>,
    pub phone: Option<String>,
    pub gst_number: Option<String>,
    pub address: Option<String>,
    pub upi_id: Option<String>,
    pub signature: Option<String>,
    pub show_customer_details: Option<bool>,
    pub print_automatically: Option<bool>,
    pub show_signature: Option<bool>,
    pub bank_details: Option<BankDetails>,
    pub terms: Option<Vec<String>>,
}

impl ProfileUpdate {
    /// Applies the scalar fields to `account`.
    pub fn apply(&mut self, account: &mut Account) -> ValidationResult<()> {
        if let Some(v) = self.username.take() {
            account.username = v.trim().to_string();
        }
        if let Some(v) = self.shop_name.take() {
            account.shop_name = v.trim().to_string();
        }
        if let Some(v) = self.phone.take() {
            account.phone = v.trim().to_string();
        }
        if self.gst_number.is_some() {
            account.gst_number = non_blank(self.gst_number.take());
        }
        if self.address.is_some() {
            account.address = non_blank(self.address.take());
        }
        if self.upi_id.is_some() {
            account.upi_id = non_blank(self.upi_id.take());
        }
        if self.signature.is_some() {
            account.signature = non_blank(self.signature.take());
        }
        if let Some(v) = self.show_customer_details {
            account.show_customer_details = v;
        }
        if let Some(v) = self.print_automatically {
            account.print_automatically = v;
        }
        if let Some(v) = self.show_signature {
            account.show_signature = v;
        }

        validate_name(&account.username, "username")?;
        validate_name(&account.shop_name, "shop_name")?;
        validate_name(&account.phone, "phone")?;

        if let Some(bank) = &self.bank_details {
            validate_name(&bank.bank_name, "bank_name")?;
            validate_name(&bank.account_number, "account_number")?;
            validate_name(&bank.ifsc_code, "ifsc_code")?;
        }
        Ok(())
    }

    /// The replacement term list, numbered in the order given.
    pub fn ordered_terms(&self) -> Option<Vec<Term>> {
        self.terms.as_ref().map(|terms| {
            terms
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .enumerate()
                .map(|(i, t)| Term {
                    term: t.to_string(),
                    order: i as i64,
                })
                .collect()
        })
    }
}

/// Body of `POST /login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn validate(&mut self) -> ValidationResult<()> {
        self.email = normalize_email(&self.email);
        if self.email.is_empty() {
            return Err(ValidationError::Required {
                field: "email".to_string(),
            });
        }
        if self.password.is_empty() {
            return Err(ValidationError::Required {
                field: "password".to_string(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
