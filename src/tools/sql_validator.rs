//! SQL statement classification for the raw-SQL tools.
//!
//! Classification is deliberately shallow: the leading keyword decides read
//! vs. write, and any `;` other than a single trailing terminator marks the
//! input as multiple statements. Nothing is parsed beyond that, so SQL that
//! opens with a CTE (`WITH ...`) or a comment is rejected as Invalid.

use crate::error::{DbError, DbResult};

/// Class of a raw SQL string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlStatementClass {
    /// Leading keyword is SELECT
    Read,
    /// INSERT, UPDATE, DELETE or REPLACE
    Write,
    /// Anything else, empty input, or more than one statement
    Invalid,
}

mod error_messages {
    pub const EMPTY: &str = "SQL is empty.";
    pub const MULTIPLE: &str =
        "Multiple statements are not allowed. Submit exactly one statement (a single trailing ';' is fine).";
    pub const READ_ONLY: &str = "run_sql only accepts a single SELECT statement.";
    pub const WRITE_ONLY: &str =
        "run_sql_write only accepts a single INSERT/UPDATE/DELETE/REPLACE statement.";
}

/// Leading keyword: the run of ASCII alphanumerics and underscores after
/// leading whitespace.
pub fn leading_keyword(sql: &str) -> &str {
    let trimmed = sql.trim_start();
    let end = trimmed
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(trimmed.len());
    &trimmed[..end]
}

/// Class by leading keyword alone, ignoring statement separators.
pub fn keyword_class(sql: &str) -> SqlStatementClass {
    let keyword = leading_keyword(sql).to_ascii_lowercase();
    match keyword.as_str() {
        "select" => SqlStatementClass::Read,
        "insert" | "update" | "delete" | "replace" => SqlStatementClass::Write,
        _ => SqlStatementClass::Invalid,
    }
}

/// True if the body still contains `;` after removing one trailing terminator.
pub fn has_internal_separator(sql: &str) -> bool {
    let trimmed = sql.trim();
    let body = trimmed.strip_suffix(';').unwrap_or(trimmed);
    body.contains(';')
}

/// Full classification: keyword class, forced to Invalid for multiple statements.
///
/// ```
/// use chinook_mcp_server::tools::sql_validator::{classify, SqlStatementClass};
///
/// assert_eq!(classify("select * from Album;"), SqlStatementClass::Read);
/// assert_eq!(classify("DELETE FROM Album WHERE AlbumId = 1"), SqlStatementClass::Write);
/// assert_eq!(classify("SELECT 1; DROP TABLE Album"), SqlStatementClass::Invalid);
/// ```
pub fn classify(sql: &str) -> SqlStatementClass {
    if has_internal_separator(sql) {
        return SqlStatementClass::Invalid;
    }
    keyword_class(sql)
}

/// Accept only a single SELECT.
pub fn validate_read(sql: &str) -> DbResult<()> {
    validate(sql, SqlStatementClass::Read, error_messages::READ_ONLY)
}

/// Accept only a single INSERT/UPDATE/DELETE/REPLACE.
pub fn validate_write(sql: &str) -> DbResult<()> {
    validate(sql, SqlStatementClass::Write, error_messages::WRITE_ONLY)
}

fn validate(sql: &str, expected: SqlStatementClass, wrong_kind: &str) -> DbResult<()> {
    if sql.trim().trim_end_matches(';').trim().is_empty() {
        return Err(DbError::invalid_input(error_messages::EMPTY));
    }
    if has_internal_separator(sql) {
        return Err(DbError::invalid_input(error_messages::MULTIPLE));
    }
    if keyword_class(sql) != expected {
        return Err(DbError::invalid_input(wrong_kind));
    }
    Ok(())
}
