//! Parameter binding for SQLite queries.
//!
//! Positional placeholders (`?`, `?NNN`) are bound in order. Named
//! placeholders (`:name`, `@name`, `$name`) are rewritten to `?N`, numbered by
//! first appearance the way SQLite assigns parameter indexes, and their values
//! are bound in that order.

use crate::error::{DbError, DbResult};
use crate::models::{QueryParam, QueryParamInput, QueryParamsInput};
use sqlx::Sqlite;
use sqlx::sqlite::SqliteArguments;
use std::collections::BTreeMap;
use std::ops::Range;

pub(crate) type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// Bind a parameter to a SQLite query.
pub(crate) fn bind_param<'q>(query: SqliteQuery<'q>, param: &'q QueryParam) -> SqliteQuery<'q> {
    match param {
        QueryParam::Null => query.bind(None::<String>),
        QueryParam::Bool(v) => query.bind(*v),
        QueryParam::Int(v) => query.bind(*v),
        QueryParam::Float(v) => query.bind(*v),
        QueryParam::String(v) => query.bind(v.as_str()),
    }
}

/// Build a query with every parameter bound in order.
pub(crate) fn bind_all<'q>(sql: &'q str, params: &'q [QueryParam]) -> SqliteQuery<'q> {
    params
        .iter()
        .fold(sqlx::query(sql), |query, param| bind_param(query, param))
}

/// A placeholder found outside string literals, quoted identifiers and comments.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Placeholder {
    span: Range<usize>,
    /// Full token including its prefix (`:cid`); None for `?` and `?NNN`
    name: Option<String>,
}

/// Turn tool input into SQL ready for [`bind_all`] and its ordered values.
///
/// A positional array leaves the SQL untouched. A named object rewrites every
/// named placeholder to `?N`. Mixing the two styles is rejected, as is a
/// named placeholder with no value. Extra keys are ignored.
pub fn resolve_params(sql: &str, params: QueryParamsInput) -> DbResult<(String, Vec<QueryParam>)> {
    let placeholders = scan_placeholders(sql);
    match params {
        QueryParamsInput::Positional(values) => {
            if let Some(named) = placeholders.iter().find_map(|p| p.name.as_deref()) {
                return Err(DbError::invalid_input(format!(
                    "Named placeholder {} needs `params` as an object keyed by name",
                    named
                )));
            }
            Ok((sql.to_string(), values.into_iter().map(Into::into).collect()))
        }
        QueryParamsInput::Named(values) => rewrite_named(sql, &placeholders, values),
    }
}

fn rewrite_named(
    sql: &str,
    placeholders: &[Placeholder],
    values: BTreeMap<String, QueryParamInput>,
) -> DbResult<(String, Vec<QueryParam>)> {
    let values: BTreeMap<&str, &QueryParamInput> = values
        .iter()
        .map(|(key, value)| (strip_prefix(key), value))
        .collect();

    let mut order: Vec<&str> = Vec::new();
    let mut rewritten = String::with_capacity(sql.len());
    let mut last = 0;
    for placeholder in placeholders {
        let Some(name) = placeholder.name.as_deref() else {
            return Err(DbError::invalid_input(
                "Cannot mix `?` placeholders with named params; use one style",
            ));
        };
        let index = match order.iter().position(|seen| *seen == name) {
            Some(i) => i + 1,
            None => {
                order.push(name);
                order.len()
            }
        };
        rewritten.push_str(&sql[last..placeholder.span.start]);
        rewritten.push_str(&format!("?{}", index));
        last = placeholder.span.end;
    }
    rewritten.push_str(&sql[last..]);

    let params = order
        .iter()
        .map(|name| {
            values
                .get(strip_prefix(name))
                .map(|value| QueryParam::from((*value).clone()))
                .ok_or_else(|| {
                    DbError::invalid_input(format!("No value supplied for placeholder {}", name))
                })
        })
        .collect::<DbResult<Vec<_>>>()?;

    Ok((rewritten, params))
}

fn strip_prefix(name: &str) -> &str {
    name.trim_start_matches([':', '@', '$'])
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}

fn scan_placeholders(sql: &str) -> Vec<Placeholder> {
    let bytes = sql.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            q @ (b'\'' | b'"' | b'`') => i = skip_quoted(bytes, i, q),
            b'[' => {
                i = bytes[i..]
                    .iter()
                    .position(|&b| b == b']')
                    .map_or(bytes.len(), |p| i + p + 1)
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                i = bytes[i..]
                    .iter()
                    .position(|&b| b == b'\n')
                    .map_or(bytes.len(), |p| i + p + 1)
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = sql[i + 2..].find("*/").map_or(bytes.len(), |p| i + 2 + p + 2)
            }
            b'?' => {
                let start = i;
                i += 1;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                found.push(Placeholder {
                    span: start..i,
                    name: None,
                });
            }
            b':' | b'@' | b'$' => {
                let start = i;
                i += 1;
                while i < bytes.len() && is_name_byte(bytes[i]) {
                    i += 1;
                }
                if i > start + 1 {
                    found.push(Placeholder {
                        span: start..i,
                        name: Some(sql[start..i].to_string()),
                    });
                }
            }
            _ => i += 1,
        }
    }
    found
}

/// Index just past the closing quote; a doubled quote is an escape.
fn skip_quoted(bytes: &[u8], open: usize, quote: u8) -> usize {
    let mut i = open + 1;
    while i < bytes.len() {
        if bytes[i] == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(pairs: &[(&str, QueryParamInput)]) -> QueryParamsInput {
        QueryParamsInput::Named(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_positional_passes_through() {
        let (sql, params) = resolve_params(
            "SELECT * FROM Track WHERE GenreId = ? AND Name LIKE ?",
            vec![QueryParamInput::Int(1), QueryParamInput::String("A%".into())].into(),
        )
        .unwrap();
        assert_eq!(sql, "SELECT * FROM Track WHERE GenreId = ? AND Name LIKE ?");
        assert_eq!(params, vec![QueryParam::Int(1), QueryParam::from("A%")]);
    }

    #[test]
    fn test_named_ordered_by_first_appearance() {
        let (sql, params) = resolve_params(
            "SELECT * FROM Customer WHERE Country = :country AND CustomerId > @min OR Country = :country",
            named(&[
                ("min", QueryParamInput::Int(2)),
                (":country", QueryParamInput::String("Portugal".into())),
                ("unused", QueryParamInput::Null),
            ]),
        )
        .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM Customer WHERE Country = ?1 AND CustomerId > ?2 OR Country = ?1"
        );
        assert_eq!(params, vec![QueryParam::from("Portugal"), QueryParam::Int(2)]);
    }

    #[test]
    fn test_literals_and_comments_skipped() {
        let (sql, params) = resolve_params(
            "SELECT ':a', \"@b\", [$c] -- :d\n FROM t /* :e */ WHERE x = $f",
            named(&[("f", QueryParamInput::Int(1))]),
        )
        .unwrap();
        assert_eq!(sql, "SELECT ':a', \"@b\", [$c] -- :d\n FROM t /* :e */ WHERE x = ?1");
        assert_eq!(params, vec![QueryParam::Int(1)]);
    }

    #[test]
    fn test_escaped_quote_inside_literal() {
        let placeholders = scan_placeholders("SELECT 'it''s :x' WHERE y = :y");
        assert_eq!(placeholders.len(), 1);
        assert_eq!(placeholders[0].name.as_deref(), Some(":y"));
    }

    #[test]
    fn test_missing_named_value() {
        let err = resolve_params("SELECT :a, :b", named(&[("a", QueryParamInput::Int(1))]))
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidInput { .. }));
        assert!(err.to_string().contains(":b"));
    }

    #[test]
    fn test_mixed_styles_rejected() {
        let err = resolve_params("SELECT :a, ?", named(&[("a", QueryParamInput::Int(1))]))
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidInput { .. }));

        let err = resolve_params("SELECT :a", vec![QueryParamInput::Int(1)].into()).unwrap_err();
        assert!(matches!(err, DbError::InvalidInput { .. }));
    }
}
