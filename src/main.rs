//! Chinook MCP Server - main entry point.
//!
//! Prepares the working copy, verifies it, resolves the customer/invoice
//! table names and then serves MCP over Streamable HTTP.

use chinook_mcp_server::auth::AuthConfig;
use chinook_mcp_server::config::Config;
use chinook_mcp_server::db::{Database, TableNames, ensure_working_copy, integrity_check};
use chinook_mcp_server::mcp::ChinookService;
use chinook_mcp_server::transport::{HttpTransport, Transport};
use humansize::{DECIMAL, format_size};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse_args();
    init_tracing(&config);

    info!("Starting Chinook MCP Server v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }

    let copy = ensure_working_copy(
        &config.db_base_path,
        &config.db_working_dir,
        config.persist_working_copy,
    )?;
    info!(
        path = %copy.path.display(),
        size = %format_size(copy.size_bytes(), DECIMAL),
        refreshed = copy.refreshed,
        "Working copy ready"
    );

    let db = Database::new(&copy.path);
    if let Err(e) = integrity_check(&db).await {
        error!(error = %e, "Refusing to start: working copy failed the integrity check");
        return Err(e.into());
    }

    let tables = match TableNames::resolve(&db).await {
        Ok(tables) => Arc::new(tables),
        Err(e) => {
            error!(error = %e, "Refusing to start: required tables are missing");
            return Err(e.into());
        }
    };

    let auth = AuthConfig::new(config.token(), &config.mcp_path);
    if !auth.is_enabled() {
        warn!("LOCAL_MCP_TOKEN is not set; the MCP endpoint is unauthenticated");
    }

    let service = ChinookService::with_write_limit(db, tables, config.max_write_rows);
    let transport = HttpTransport::new(
        service,
        &config.host,
        config.port,
        &config.mcp_path,
        auth,
    );
    info!(
        transport = transport.name(),
        host = %config.host,
        port = config.port,
        endpoint = %config.mcp_path,
        "Using HTTP transport"
    );

    if let Err(e) = transport.run().await {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
