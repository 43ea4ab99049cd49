//! HTTP handlers, one module per resource.
//!
//! Handlers stay thin: extract, call a repository, map the error.

pub mod account_service;
pub mod admin_service;
pub mod directory_service;
pub mod health_service;
pub mod import_service;
pub mod product_service;
pub mod sale_service;
pub mod settings_service;
pub mod subscription_service;
pub mod ticket_service;

use chrono::{NaiveDate, Utc};

/// The date expiry labels and filters are computed against.
pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}
