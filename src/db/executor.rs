//! Statement execution on a borrowed connection.
//!
//! Both entry points take `&mut SqliteConnection` so they always run inside a
//! transaction opened by [`Database::with_transaction`](crate::db::Database::with_transaction).
//! They never commit or roll back themselves.

use crate::db::params::bind_all;
use crate::db::types::row_to_json;
use crate::error::{DbError, DbResult};
use crate::models::{QueryParam, ReadResult};
use sqlx::{Column, Executor, SqliteConnection, Statement};
use std::time::Instant;
use tracing::{debug, warn};

/// Run a read statement and collect every row.
pub async fn execute_read(
    conn: &mut SqliteConnection,
    sql: &str,
    params: &[QueryParam],
) -> DbResult<ReadResult> {
    let start = Instant::now();
    debug!(sql = %sql, params = ?param_types(params), "Executing read");

    // Prepare first so column names are known even for empty results.
    let statement = (&mut *conn).prepare(sql).await?;
    let columns: Vec<String> = statement
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();

    let rows = bind_all(sql, params).fetch_all(&mut *conn).await?;
    let rows: Vec<_> = rows.iter().map(row_to_json).collect();

    debug!(
        rows = rows.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Read complete"
    );
    Ok(ReadResult { columns, rows })
}

/// Run a write statement and return the number of affected rows.
///
/// The cap is enforced on every row the statement changed, including rows
/// written by triggers and foreign-key actions (`total_changes()` delta).
/// Fails with [`DbError::CapacityExceeded`] when that exceeds `max_affected`;
/// the caller's transaction then rolls the change back.
pub async fn execute_write(
    conn: &mut SqliteConnection,
    sql: &str,
    params: &[QueryParam],
    max_affected: u64,
) -> DbResult<u64> {
    let start = Instant::now();
    debug!(sql = %sql, params = ?param_types(params), "Executing write");

    let before = total_changes(conn).await?;
    let result = bind_all(sql, params).execute(&mut *conn).await?;
    let affected = result.rows_affected();
    let changed = u64::try_from(total_changes(conn).await? - before).unwrap_or(0);

    if changed > max_affected {
        warn!(
            affected,
            changed,
            limit = max_affected,
            "Write exceeded affected-row limit"
        );
        return Err(DbError::capacity_exceeded(changed, max_affected));
    }

    debug!(
        affected,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Write complete"
    );
    Ok(affected)
}

/// Run an INSERT and return the rowid it assigned.
pub async fn execute_insert(
    conn: &mut SqliteConnection,
    sql: &str,
    params: &[QueryParam],
) -> DbResult<i64> {
    let result = bind_all(sql, params).execute(&mut *conn).await?;
    Ok(result.last_insert_rowid())
}

/// Rows changed on this connection since it was opened, triggers included.
async fn total_changes(conn: &mut SqliteConnection) -> DbResult<i64> {
    let changes: i64 = sqlx::query_scalar("SELECT total_changes()")
        .fetch_one(&mut *conn)
        .await?;
    Ok(changes)
}

fn param_types(params: &[QueryParam]) -> Vec<&'static str> {
    params.iter().map(QueryParam::type_name).collect()
}

/// Quote an identifier for splicing into SQL.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
