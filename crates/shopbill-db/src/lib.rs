//! # shopbill-db: Database Layer for Shopbill
//!
//! Persistence for shop owners' accounts, catalog, sales, subscriptions,
//! customer and vendor directories, bill settings and support tickets.
//! SQLite through sqlx; every repository scopes its queries by owner.
//!
//! ```text
//! POST /sales ──► SaleRepository::create
//!                   ├── sequence::allocate(SequenceKind::InvoiceNumber) ──► INV-00042
//!                   ├── snapshot price + tax per line
//!                   ├── debit product stock
//!                   └── COMMIT (one transaction, one SQLite writer)
//! ```
//!
//! The schema lives in `migrations/sqlite/` and is applied by [`pool::Database::new`].
//! Codes and invoice numbers come from the `sequences` table, never from
//! `MAX(..) + 1`, so two writers cannot hand out the same number.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shopbill_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("shopbill.db")).await?;
//!
//! let sale = db.sales().create(&owner_id, new_sale).await?;
//! println!("{} total {}", sale.sale.invoice_number, sale.sale.total());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::{
    AccountRepository, BillSettingsRepository, CustomerFilter, CustomerRepository,
    ProductFilter, ProductRepository, SaleFilter, SaleRepository, SubscriptionRepository,
    TicketRepository, VendorFilter, VendorRepository, Viewer,
};
pub use repository::product::ProductSalesSummary;
