//! # Repository Module
//!
//! One repository per aggregate. Every query that touches owner data takes
//! the owner id and filters by it; another owner's row reads as not found.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.sales().create(&owner_id, new_sale)                        │
//! │       ▼                                                                 │
//! │  SaleRepository                                                        │
//! │  ├── create(&self, owner, input)    one transaction                    │
//! │  ├── get(&self, owner, id)                                             │
//! │  ├── list(&self, owner, filter)                                        │
//! │  └── delete(&self, owner, id)       items cascade                      │
//! │       │                                                                 │
//! │       │  sequence::allocate ─► UPDATE sequences ... RETURNING value    │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`AccountRepository`] - Accounts, shop profile, bank details, terms
//! - [`ProductRepository`] - Catalog CRUD, listing filters, units sold
//! - [`SaleRepository`] - Transactional sale creation and reads
//! - [`SubscriptionRepository`] - Plans, subscriptions, lazy expiry
//! - [`CustomerRepository`] / [`VendorRepository`] - Directory
//! - [`BillSettingsRepository`] - Per-owner invoice settings
//! - [`TicketRepository`] - Support tickets and attachments

pub mod account;
pub mod bill_settings;
pub mod customer;
pub mod product;
pub mod sale;
pub mod sequence;
pub mod subscription;
pub mod ticket;
pub mod vendor;

pub use account::AccountRepository;
pub use bill_settings::BillSettingsRepository;
pub use customer::{CustomerFilter, CustomerRepository};
pub use product::{ProductFilter, ProductRepository};
pub use sale::{SaleFilter, SaleRepository};
pub use subscription::SubscriptionRepository;
pub use ticket::{TicketRepository, Viewer};
pub use vendor::{VendorFilter, VendorRepository};

/// Wraps a search term for a `LIKE` match anywhere in the column.
pub(crate) fn like_pattern(term: &str) -> String {
    format!("%{}%", term)
}
