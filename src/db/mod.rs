//! Database access layer.
//!
//! - Working-copy management and the startup integrity guard
//! - Scoped transactions on a per-call connection
//! - Statement execution and SQLite → JSON conversion
//! - Schema introspection and table-name resolution

pub mod client;
pub mod executor;
pub mod integrity;
pub mod params;
pub mod schema;
pub mod tables;
pub mod types;
pub mod working_copy;

pub use client::Database;
pub use executor::{execute_insert, execute_read, execute_write, quote_ident};
pub use integrity::integrity_check;
pub use params::resolve_params;
pub use tables::TableNames;
pub use working_copy::{WorkingCopy, ensure_working_copy};
