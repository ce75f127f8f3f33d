//! Chinook MCP Server library.
//!
//! MCP tools, a schema resource and a prompt over a private working copy of
//! the Chinook SQLite sample database, served over Streamable HTTP.

pub mod auth;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod mcp;
pub mod models;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use error::DbError;
pub use mcp::ChinookService;
