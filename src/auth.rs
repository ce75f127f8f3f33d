//! Bearer-token gate for the MCP mount.
//!
//! With a token configured, every request whose path is the mount path or
//! nested under it must carry `Authorization: Bearer <token>`. Other paths,
//! such as `/health`, pass through untouched.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

const UNAUTHORIZED_BODY: &str = r#"{"error":"unauthorized"}"#;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Full expected header value, `Bearer <token>`; None disables the gate.
    expected_header: Option<String>,
    mount_path: String,
}

impl AuthConfig {
    pub fn new(token: Option<&str>, mount_path: &str) -> Self {
        let expected_header = token
            .filter(|t| !t.trim().is_empty())
            .map(|t| format!("Bearer {}", t));
        let trimmed = mount_path.trim_end_matches('/');
        let mount_path = if trimmed.is_empty() {
            "/".to_string()
        } else {
            trimmed.to_string()
        };
        Self {
            expected_header,
            mount_path,
        }
    }

    pub fn disabled() -> Self {
        Self::new(None, "/")
    }

    pub fn is_enabled(&self) -> bool {
        self.expected_header.is_some()
    }

    pub fn mount_path(&self) -> &str {
        &self.mount_path
    }

    /// Path equals the mount or sits below it. A root mount covers everything.
    pub fn is_protected(&self, path: &str) -> bool {
        if self.mount_path == "/" {
            return true;
        }
        match path.strip_prefix(self.mount_path.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    fn accepts(&self, header_value: Option<&[u8]>) -> bool {
        match (&self.expected_header, header_value) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(expected), Some(provided)) => constant_time_eq(provided, expected.as_bytes()),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::disabled()
    }
}

pub async fn auth_middleware(
    State(auth_config): State<Arc<AuthConfig>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !auth_config.is_enabled() || !auth_config.is_protected(request.uri().path()) {
        return next.run(request).await;
    }

    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .map(|value| value.as_bytes());

    if auth_config.accepts(provided) {
        debug!(path = %request.uri().path(), "Authorized request");
        return next.run(request).await;
    }

    match provided {
        None => warn!(path = %request.uri().path(), "Authentication failed: missing Authorization header"),
        Some(raw) => {
            let presented = String::from_utf8_lossy(raw);
            let token = presented.strip_prefix("Bearer ").unwrap_or(&presented);
            warn!(
                path = %request.uri().path(),
                token_prefix = %mask_token(token),
                "Authentication failed: invalid token"
            );
        }
    }
    unauthorized_response()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

fn mask_token(token: &str) -> String {
    if token.chars().count() <= 3 {
        "***".to_string()
    } else {
        format!("{}***", token.chars().take(3).collect::<String>())
    }
}

fn unauthorized_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::CONTENT_TYPE, "application/json")],
        UNAUTHORIZED_BODY,
    )
        .into_response()
}
