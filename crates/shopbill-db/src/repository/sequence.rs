//! # Sequence Allocation
//!
//! Business identifiers (`PRD-0001`, `INV-00001`) come from counter rows in
//! the `sequences` table.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    UPDATE sequences SET value = value + 1                               │
//! │     WHERE name = 'invoice_number' RETURNING value     ◄── write lock    │
//! │    INSERT INTO sales (... invoice_number = 'INV-00042' ...)             │
//! │    ...                                                                  │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  A second creator blocks on the write lock (busy_timeout) until the     │
//! │  first commits, then increments past it. A rolled-back transaction     │
//! │  rolls its increment back too, so numbers are gap-free in practice.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The increment must be the first write of the transaction. Reads before
//! it would pin an older snapshot, and SQLite refuses to upgrade a stale
//! snapshot to a writer.

use shopbill_core::catalog::SequenceKind;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};

/// How many times a creator draws a new number after its formatted value
/// collided with an existing row.
pub const MAX_ALLOCATION_ATTEMPTS: u32 = 5;

/// Draws the next value of `kind` and returns it formatted.
pub async fn allocate(conn: &mut SqliteConnection, kind: SequenceKind) -> DbResult<String> {
    let value: Option<i64> =
        sqlx::query_scalar("UPDATE sequences SET value = value + 1 WHERE name = ?1 RETURNING value")
            .bind(kind.name())
            .fetch_optional(&mut *conn)
            .await?;

    let value = value.ok_or_else(|| {
        DbError::Internal(format!("sequence '{}' is not initialised", kind.name()))
    })?;

    let formatted = kind.format(value);
    debug!(sequence = kind.name(), value, formatted = %formatted, "Allocated sequence value");
    Ok(formatted)
}

/// Current value of a sequence (last value handed out).
pub async fn current(conn: &mut SqliteConnection, kind: SequenceKind) -> DbResult<i64> {
    let value: i64 = sqlx::query_scalar("SELECT value FROM sequences WHERE name = ?1")
        .bind(kind.name())
        .fetch_one(&mut *conn)
        .await?;
    Ok(value)
}
