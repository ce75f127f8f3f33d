//! MCP server integration.

pub mod service;

pub use service::{ChinookService, SCHEMA_RESOURCE_URI};
