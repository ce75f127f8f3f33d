//! SQLite value to JSON conversion.
//!
//! SQLite is dynamically typed: a column declared `NUMERIC(10,2)` can hold
//! integers, reals or text row by row. Cells are therefore classified by the
//! storage class of the value itself, not by the declared column type.

use serde_json::Value as JsonValue;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, TypeInfo, ValueRef};

/// Storage class of a single SQLite value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Null,
    Integer,
    Float,
    Text,
    Binary,
}

/// Classify a SQLite runtime type name (`INTEGER`, `REAL`, `TEXT`, `BLOB`, `NULL`).
pub fn categorize_type(type_name: &str) -> TypeCategory {
    match type_name.to_ascii_uppercase().as_str() {
        "NULL" => TypeCategory::Null,
        "INTEGER" | "INT" | "INT8" | "BIGINT" | "BOOLEAN" => TypeCategory::Integer,
        "REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" => TypeCategory::Float,
        "BLOB" => TypeCategory::Binary,
        _ => TypeCategory::Text,
    }
}

/// Placeholder rendered in place of BLOB contents.
pub fn blob_placeholder(len: usize) -> JsonValue {
    JsonValue::String(format!("<{} bytes>", len))
}

/// Convert every cell of a row to JSON, in column order.
pub fn row_to_json(row: &SqliteRow) -> Vec<JsonValue> {
    (0..row.columns().len())
        .map(|idx| decode_cell(row, idx))
        .collect()
}

/// Decode one cell based on the runtime storage class of its value.
pub fn decode_cell(row: &SqliteRow, idx: usize) -> JsonValue {
    let category = match row.try_get_raw(idx) {
        Ok(raw) if raw.is_null() => TypeCategory::Null,
        Ok(raw) => categorize_type(raw.type_info().name()),
        Err(_) => return JsonValue::Null,
    };

    match category {
        TypeCategory::Null => JsonValue::Null,
        TypeCategory::Integer => row
            .try_get::<i64, _>(idx)
            .map(|v| JsonValue::Number(v.into()))
            .unwrap_or(JsonValue::Null),
        TypeCategory::Float => match row.try_get::<f64, _>(idx) {
            Ok(v) => serde_json::Number::from_f64(v)
                .map(JsonValue::Number)
                .unwrap_or_else(|| JsonValue::String(v.to_string())),
            Err(_) => JsonValue::Null,
        },
        TypeCategory::Binary => row
            .try_get::<Vec<u8>, _>(idx)
            .map(|v| blob_placeholder(v.len()))
            .unwrap_or(JsonValue::Null),
        TypeCategory::Text => row
            .try_get::<String, _>(idx)
            .map(JsonValue::String)
            .unwrap_or(JsonValue::Null),
    }
}
