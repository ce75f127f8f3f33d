//! Schema introspection queries.
//!
//! Table names reach PRAGMA only through the table-valued forms
//! (`pragma_table_info(?)`), so user-supplied names are always bound as
//! parameters and never spliced into SQL text.

use crate::db::executor::quote_ident;
use crate::error::{DbError, DbResult};
use crate::models::{ColumnInfo, ForeignKeyInfo, SchemaSnapshot, TableDescription, TableSummary};
use sqlx::{Row, SqliteConnection};
use tracing::debug;

mod queries {
    pub const LIST_TABLES: &str = r#"
        SELECT name FROM sqlite_master
        WHERE type = 'table'
        AND name NOT LIKE 'sqlite_%'
        ORDER BY name
        "#;

    pub const FIND_TABLE_EXACT: &str =
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1";

    pub const FIND_TABLE_NOCASE: &str = r#"
        SELECT name FROM sqlite_master
        WHERE type = 'table' AND lower(name) = lower(?1)
        ORDER BY name
        LIMIT 1
        "#;

    pub const TABLE_INFO: &str = r#"
        SELECT name, type, "notnull", dflt_value, pk
        FROM pragma_table_info(?1)
        ORDER BY cid
        "#;

    pub const FOREIGN_KEYS: &str = r#"
        SELECT "from", "table", "to"
        FROM pragma_foreign_key_list(?1)
        ORDER BY id, seq
        "#;

    pub const COUNT_USER_TABLES: &str = r#"
        SELECT COUNT(*) FROM sqlite_master
        WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
        "#;
}

/// Names of all user tables, sorted.
pub async fn list_table_names(conn: &mut SqliteConnection) -> DbResult<Vec<String>> {
    let names: Vec<String> = sqlx::query_scalar(queries::LIST_TABLES)
        .fetch_all(&mut *conn)
        .await?;
    debug!(count = names.len(), "Listed tables");
    Ok(names)
}

/// Number of user tables.
pub async fn count_user_tables(conn: &mut SqliteConnection) -> DbResult<i64> {
    let n: i64 = sqlx::query_scalar(queries::COUNT_USER_TABLES)
        .fetch_one(&mut *conn)
        .await?;
    Ok(n)
}

/// Look a table up by name: exact match first, then case-insensitive.
///
/// Returns the catalog's own spelling.
pub async fn find_table(conn: &mut SqliteConnection, name: &str) -> DbResult<Option<String>> {
    let exact: Option<String> = sqlx::query_scalar(queries::FIND_TABLE_EXACT)
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;
    if exact.is_some() {
        return Ok(exact);
    }
    let nocase: Option<String> = sqlx::query_scalar(queries::FIND_TABLE_NOCASE)
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(nocase)
}

/// Row count of one table. `table` must be a real catalog name.
pub async fn count_rows(conn: &mut SqliteConnection, table: &str) -> DbResult<u64> {
    let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
    let n: i64 = sqlx::query_scalar(&sql).fetch_one(&mut *conn).await?;
    Ok(n.max(0) as u64)
}

/// Every user table with its row count.
pub async fn list_tables_with_counts(conn: &mut SqliteConnection) -> DbResult<Vec<TableSummary>> {
    let names = list_table_names(conn).await?;
    let mut tables = Vec::with_capacity(names.len());
    for name in names {
        let row_count = count_rows(conn, &name).await?;
        tables.push(TableSummary { name, row_count });
    }
    Ok(tables)
}

/// Columns and foreign keys of `table`.
///
/// Fails with [`DbError::NotFound`] when the table has no columns, which is
/// how SQLite reports an unknown table through `pragma_table_info`.
pub async fn describe_table(
    conn: &mut SqliteConnection,
    table: &str,
) -> DbResult<TableDescription> {
    let columns = fetch_columns(conn, table).await?;
    if columns.is_empty() {
        return Err(DbError::not_found("table", table));
    }
    let foreign_keys = fetch_foreign_keys(conn, table).await?;

    Ok(TableDescription {
        name: table.to_string(),
        columns,
        foreign_keys,
    })
}

/// Describe every user table.
pub async fn snapshot(conn: &mut SqliteConnection) -> DbResult<SchemaSnapshot> {
    let names = list_table_names(conn).await?;
    let mut tables = Vec::with_capacity(names.len());
    for name in &names {
        tables.push(describe_table(conn, name).await?);
    }
    Ok(SchemaSnapshot { tables })
}

async fn fetch_columns(conn: &mut SqliteConnection, table: &str) -> DbResult<Vec<ColumnInfo>> {
    let rows = sqlx::query(queries::TABLE_INFO)
        .bind(table)
        .fetch_all(&mut *conn)
        .await?;

    rows.iter()
        .map(|row| -> DbResult<ColumnInfo> {
            let name: String = row.try_get("name")?;
            let data_type: Option<String> = row.try_get("type")?;
            let notnull: i64 = row.try_get("notnull")?;
            let default: Option<String> = row.try_get("dflt_value")?;
            let pk: i64 = row.try_get("pk")?;

            Ok(ColumnInfo::new(name, data_type.unwrap_or_default())
                .with_primary_key(pk > 0)
                .with_not_null(notnull != 0)
                .with_default(default))
        })
        .collect()
}

async fn fetch_foreign_keys(
    conn: &mut SqliteConnection,
    table: &str,
) -> DbResult<Vec<ForeignKeyInfo>> {
    let rows = sqlx::query(queries::FOREIGN_KEYS)
        .bind(table)
        .fetch_all(&mut *conn)
        .await?;

    rows.iter()
        .map(|row| -> DbResult<ForeignKeyInfo> {
            Ok(ForeignKeyInfo {
                from: row.try_get("from")?,
                to_table: row.try_get("table")?,
                to_column: row.try_get("to")?,
            })
        })
        .collect()
}
