//! # shopbill-core: Pure Business Logic for Shopbill
//!
//! Billing rules with no I/O: line and invoice arithmetic, product code and
//! invoice number formats, expiry windows, subscription status and input
//! validation. The database and HTTP crates call into it; it calls nothing.
//!
//! | Module         | Holds                                              |
//! |----------------|----------------------------------------------------|
//! | `money`        | `Money` in paise, decimal parsing                  |
//! | `types`        | `Product`, `Sale`, `TaxRate` and other records     |
//! | `invoice`      | per-line amounts and sale roll-up                  |
//! | `catalog`      | code formats, expiry windows, product input        |
//! | `subscription` | plan durations, active/expired status              |
//! | `account`      | registration and login input                       |
//! | `directory`    | customer and vendor records                        |
//! | `validation`   | shared field checks                                |
//!
//! Time is always passed in; nothing here reads the clock.
//!
//! ## Example Usage
//!
//! ```rust
//! use shopbill_core::invoice::{LineAmounts, SaleTotals};
//! use shopbill_core::money::Money;
//! use shopbill_core::types::TaxRate;
//!
//! let line = LineAmounts::compute(Money::from_cents(10000), 3, TaxRate::from_bps(1800)).unwrap();
//! let totals = SaleTotals::rollup([&line], Money::zero()).unwrap();
//! assert_eq!(totals.total.to_string(), "354.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod account;
pub mod catalog;
pub mod directory;
pub mod error;
pub mod invoice;
pub mod money;
pub mod subscription;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;
