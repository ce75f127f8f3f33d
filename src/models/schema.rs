//! Schema-related data models.
//!
//! This module defines the shapes returned by schema introspection: the
//! per-table description used by `get_table_info` and the whole-database
//! snapshot served at `schema://current`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnInfo {
    pub name: String,
    /// Declared type as written in the CREATE TABLE statement (may be empty)
    #[serde(rename = "type")]
    pub data_type: String,
    /// True if the column is part of the primary key
    pub pk: bool,
    pub not_null: bool,
    /// Default value expression, verbatim
    pub default: Option<String>,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            pk: false,
            not_null: false,
            default: None,
        }
    }

    pub fn with_primary_key(mut self, pk: bool) -> Self {
        self.pk = pk;
        self
    }

    pub fn with_not_null(mut self, not_null: bool) -> Self {
        self.not_null = not_null;
        self
    }

    pub fn with_default(mut self, default: Option<String>) -> Self {
        self.default = default;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ForeignKeyInfo {
    /// Referencing column in this table
    pub from: String,
    pub to_table: String,
    /// Referenced column; absent when the key targets the parent's primary key implicitly
    pub to_column: Option<String>,
}

/// Columns and outgoing foreign keys of one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TableDescription {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    pub foreign_keys: Vec<ForeignKeyInfo>,
}

impl TableDescription {
    /// Names of the primary key columns, in declaration order.
    pub fn primary_key(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.pk)
            .map(|c| c.name.as_str())
            .collect()
    }
}

/// A user table and its current row count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TableSummary {
    pub name: String,
    pub row_count: u64,
}

/// Every user table, described. Recomputed on each request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SchemaSnapshot {
    pub tables: Vec<TableDescription>,
}

impl SchemaSnapshot {
    pub fn table(&self, name: &str) -> Option<&TableDescription> {
        self.tables.iter().find(|t| t.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_info_serializes_type_key() {
        let col = ColumnInfo::new("CustomerId", "INTEGER")
            .with_primary_key(true)
            .with_not_null(true);
        let json = serde_json::to_value(&col).unwrap();
        assert_eq!(json["type"], "INTEGER");
        assert_eq!(json["pk"], true);
        assert!(json["default"].is_null());
    }

    #[test]
    fn test_primary_key_columns() {
        let table = TableDescription {
            name: "PlaylistTrack".into(),
            columns: vec![
                ColumnInfo::new("PlaylistId", "INTEGER").with_primary_key(true),
                ColumnInfo::new("TrackId", "INTEGER").with_primary_key(true),
                ColumnInfo::new("Note", "TEXT"),
            ],
            foreign_keys: vec![],
        };
        assert_eq!(table.primary_key(), vec!["PlaylistId", "TrackId"]);
    }
}
