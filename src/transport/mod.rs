//! Transport layer for the MCP server.
//!
//! Only Streamable HTTP is served; see `http`.

pub mod http;

pub use http::HttpTransport;

use crate::error::DbResult;
use std::future::Future;

/// A way of serving the MCP service to clients.
pub trait Transport: Send + Sync {
    /// Serve until shutdown.
    fn run(&self) -> impl Future<Output = DbResult<()>> + Send;

    /// Name used in logs.
    fn name(&self) -> &'static str;
}
