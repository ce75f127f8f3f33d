//! Data models for the Chinook MCP server.
//!
//! This module re-exports all model types used throughout the application.

pub mod query;
pub mod schema;

pub use query::{
    DEFAULT_MAX_AFFECTED_ROWS, QueryParam, QueryParamInput, QueryParamsInput, ReadResult,
};
pub use schema::{ColumnInfo, ForeignKeyInfo, SchemaSnapshot, TableDescription, TableSummary};
