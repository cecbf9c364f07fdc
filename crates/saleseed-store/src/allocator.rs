//! Explicit identifier allocation for bulk inserts.
//!
//! SQLite `AUTOINCREMENT` keys only grow, so the rows created by one insert
//! are exactly the ids above the maximum observed immediately before it. The
//! caller is expected to run the three steps inside one transaction.

use sqlx::SqliteConnection;

use crate::bulk::{Insertable, insert_chunked};
use crate::errors::{StoreError, StoreResult};

/// Current maximum id of `table`, or 0 when empty.
pub async fn max_id(conn: &mut SqliteConnection, table: &'static str) -> StoreResult<i64> {
    let value = sqlx::query_scalar::<_, i64>(&format!("SELECT COALESCE(MAX(id), 0) FROM {table}"))
        .fetch_one(&mut *conn)
        .await?;
    Ok(value)
}

/// Every id of `table` strictly greater than `after`, ascending.
pub async fn ids_after(
    conn: &mut SqliteConnection,
    table: &'static str,
    after: i64,
) -> StoreResult<Vec<i64>> {
    let ids = sqlx::query_scalar::<_, i64>(&format!(
        "SELECT id FROM {table} WHERE id > ? ORDER BY id"
    ))
    .bind(after)
    .fetch_all(&mut *conn)
    .await?;
    Ok(ids)
}

/// Fail unless exactly `expected` ids were allocated.
pub fn verify_allocation(table: &'static str, expected: usize, ids: &[i64]) -> StoreResult<()> {
    if ids.len() == expected {
        Ok(())
    } else {
        Err(StoreError::Integrity {
            table,
            expected,
            actual: ids.len(),
        })
    }
}

/// Insert `rows` and return the ids assigned to them, in insert order.
///
/// Any extra or missing id (a concurrent writer, a skipped duplicate) is an
/// [`StoreError::Integrity`] failure; the caller's transaction should then be
/// dropped so nothing from this batch persists.
pub async fn insert_and_allocate<R: Insertable>(
    conn: &mut SqliteConnection,
    rows: &[R],
    chunk_size: usize,
) -> StoreResult<Vec<i64>> {
    let before = max_id(conn, R::TABLE).await?;
    insert_chunked(conn, rows, chunk_size).await?;
    let ids = ids_after(conn, R::TABLE, before).await?;
    verify_allocation(R::TABLE, rows.len(), &ids)?;
    Ok(ids)
}
