//! Startup integrity guard.

use crate::db::Database;
use crate::db::schema::count_user_tables;
use crate::error::{DbError, DbResult};
use sqlx::SqliteConnection;
use tracing::info;

/// Verify the working copy before serving.
///
/// Runs `PRAGMA integrity_check` and a smoke query counting user tables, both
/// inside one transaction. Returns the table count. Any problem, including a
/// database without user tables or a file SQLite cannot open, is reported
/// as [`DbError::Integrity`].
pub async fn integrity_check(db: &Database) -> DbResult<i64> {
    let tables = db
        .with_transaction(|conn| Box::pin(check_tx(conn)))
        .await
        .map_err(|e| match e {
            DbError::Integrity { .. } => e,
            other => DbError::integrity(other.to_string()),
        })?;
    info!(path = %db.path().display(), tables, "Integrity check passed");
    Ok(tables)
}

async fn check_tx(conn: &mut SqliteConnection) -> DbResult<i64> {
    let report: Vec<String> = sqlx::query_scalar("PRAGMA integrity_check")
        .fetch_all(&mut *conn)
        .await?;

    match report.as_slice() {
        [only] if only.eq_ignore_ascii_case("ok") => {}
        [] => return Err(DbError::integrity("integrity_check returned nothing")),
        problems => return Err(DbError::integrity(problems.join("; "))),
    }

    let tables = count_user_tables(conn).await?;
    if tables == 0 {
        return Err(DbError::integrity("database contains no user tables"));
    }
    Ok(tables)
}
