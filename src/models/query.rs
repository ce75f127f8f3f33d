//! Query-related data models.
//!
//! This module defines bound parameter values and raw read results.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Default cap on rows a single raw write may touch.
pub const DEFAULT_MAX_AFFECTED_ROWS: u64 = 10_000;

/// A parameter value bound to a `?` placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryParam {
    Null,
    Bool(bool),
    /// Integer value (stored as i64 for maximum range)
    Int(i64),
    Float(f64),
    String(String),
}

impl QueryParam {
    /// Type name used in debug logs.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
        }
    }
}

impl From<i64> for QueryParam {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for QueryParam {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for QueryParam {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for QueryParam {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl<T: Into<QueryParam>> From<Option<T>> for QueryParam {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

/// Tool-facing parameter: any JSON scalar.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum QueryParamInput {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Float value
    Float(f64),
    /// String value
    String(String),
}

impl From<QueryParamInput> for QueryParam {
    fn from(input: QueryParamInput) -> Self {
        match input {
            QueryParamInput::Null => QueryParam::Null,
            QueryParamInput::Bool(v) => QueryParam::Bool(v),
            QueryParamInput::Int(v) => QueryParam::Int(v),
            QueryParamInput::Float(v) => QueryParam::Float(v),
            QueryParamInput::String(v) => QueryParam::String(v),
        }
    }
}

/// Tool-facing parameter set: a positional array for `?` placeholders, or an
/// object keyed by name for `:name`, `@name` and `$name` placeholders.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum QueryParamsInput {
    /// Values bound to `?` placeholders in order
    Positional(Vec<QueryParamInput>),
    /// Values bound to named placeholders; keys may omit the prefix
    Named(BTreeMap<String, QueryParamInput>),
}

impl Default for QueryParamsInput {
    fn default() -> Self {
        Self::Positional(Vec::new())
    }
}

impl QueryParamsInput {
    pub fn len(&self) -> usize {
        match self {
            Self::Positional(values) => values.len(),
            Self::Named(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<QueryParamInput>> for QueryParamsInput {
    fn from(values: Vec<QueryParamInput>) -> Self {
        Self::Positional(values)
    }
}

/// Rows fetched by a read, in column order.
///
/// `columns` comes from the prepared statement, so it is populated even when
/// no rows match.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReadResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<JsonValue>>,
}

impl ReadResult {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_param_types() {
        assert_eq!(QueryParam::Null.type_name(), "null");
        assert_eq!(QueryParam::Int(42).type_name(), "int");
        assert_eq!(QueryParam::from("hello").type_name(), "string");
        assert_eq!(QueryParam::from(None::<&str>), QueryParam::Null);
    }

    #[test]
    fn test_param_input_from_json_scalars() {
        let params: Vec<QueryParamInput> =
            serde_json::from_value(json!([null, true, 3, 1.5, "x"])).unwrap();
        let params: Vec<QueryParam> = params.into_iter().map(Into::into).collect();
        assert_eq!(
            params,
            vec![
                QueryParam::Null,
                QueryParam::Bool(true),
                QueryParam::Int(3),
                QueryParam::Float(1.5),
                QueryParam::String("x".to_string()),
            ]
        );
    }

    #[test]
    fn test_params_input_array_or_object() {
        let positional: QueryParamsInput = serde_json::from_value(json!([1, "x"])).unwrap();
        assert!(matches!(positional, QueryParamsInput::Positional(ref v) if v.len() == 2));

        let named: QueryParamsInput =
            serde_json::from_value(json!({"cid": 1, ":name": "x"})).unwrap();
        match named {
            QueryParamsInput::Named(values) => {
                assert!(values.contains_key("cid"));
                assert!(values.contains_key(":name"));
            }
            other => panic!("expected Named, got {other:?}"),
        }

        assert!(QueryParamsInput::default().is_empty());
    }

    #[test]
    fn test_read_result_counts() {
        let result = ReadResult {
            columns: vec!["id".into(), "name".into()],
            rows: vec![vec![json!(1), json!("AC/DC")]],
        };
        assert_eq!(result.row_count(), 1);
        assert!(!result.is_empty());
    }
}
