//! Streamable HTTP transport for the MCP server.
//!
//! Serves the MCP endpoint at the configured mount path, an unauthenticated
//! `GET /health` probe, and the bearer-token gate in front of both.

use crate::auth::{AuthConfig, auth_middleware};
use crate::error::{DbError, DbResult};
use crate::mcp::ChinookService;
use crate::transport::Transport;
use axum::{Json, Router, middleware, routing::get};
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

/// How long open SSE streams may delay shutdown after the first signal.
const GRACEFUL_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpTransport {
    service: ChinookService,
    auth: Arc<AuthConfig>,
    host: String,
    port: u16,
    /// MCP mount path (e.g., "/mcp")
    endpoint: String,
}

impl HttpTransport {
    pub fn new(
        service: ChinookService,
        host: impl Into<String>,
        port: u16,
        endpoint: impl Into<String>,
        auth: AuthConfig,
    ) -> Self {
        Self {
            service,
            auth: Arc::new(auth),
            host: host.into(),
            port,
            endpoint: endpoint.into(),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Full application router: health probe, MCP mount, auth layer.
    pub fn router(&self) -> Router {
        let service = self.service.clone();
        let mcp = StreamableHttpService::new(
            move || Ok(service.clone()),
            LocalSessionManager::default().into(),
            Default::default(),
        );

        let app = Router::new().route("/health", get(health));
        // nest_service rejects "/", so the root mount becomes the fallback
        let app = if self.endpoint == "/" {
            app.fallback_service(mcp)
        } else {
            app.nest_service(&self.endpoint, mcp)
        };

        app.layer(middleware::from_fn_with_state(
            self.auth.clone(),
            auth_middleware,
        ))
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

impl Transport for HttpTransport {
    async fn run(&self) -> DbResult<()> {
        let bind_addr = self.bind_addr();
        let app = self.router();

        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| DbError::config(format!("Failed to bind to {}: {}", bind_addr, e)))?;

        info!(
            addr = %bind_addr,
            endpoint = %self.endpoint,
            auth = self.auth.is_enabled(),
            "MCP endpoint ready"
        );

        let shutdown_notify = Arc::new(tokio::sync::Notify::new());
        let shutdown_notify_clone = shutdown_notify.clone();
        let shutdown_signal = async move {
            wait_for_signal().await;
            shutdown_notify_clone.notify_one();
        };

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal);

        // Streaming sessions can hold the server open; a timeout or a second
        // signal ends the wait.
        tokio::select! {
            result = server => {
                match result {
                    Ok(()) => info!("HTTP server stopped"),
                    Err(e) => {
                        error!(error = %e, "HTTP server error");
                        return Err(DbError::internal(format!("HTTP server error: {}", e)));
                    }
                }
            }
            _ = async {
                shutdown_notify.notified().await;
                info!(
                    timeout_secs = GRACEFUL_TIMEOUT.as_secs(),
                    "Waiting for connections to close (send signal again to force exit)..."
                );
                tokio::select! {
                    _ = tokio::time::sleep(GRACEFUL_TIMEOUT) => {
                        warn!("Graceful shutdown timeout, forcing exit");
                    }
                    _ = wait_for_signal() => {
                        warn!("Received second signal, forcing immediate exit");
                    }
                }
            } => {}
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Resolves on SIGINT or SIGTERM.
async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
