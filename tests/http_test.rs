//! Integration tests for the HTTP surface: health probe, bearer-token gate
//! and the schema resource.

mod common;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use chinook_mcp_server::auth::AuthConfig;
use chinook_mcp_server::mcp::ChinookService;
use chinook_mcp_server::transport::HttpTransport;
use common::{Naming, scalar_i64, setup};
use rmcp::model::{ErrorCode, ResourceContents};
use serde_json::{Value, json};
use tower::ServiceExt;

async fn router(token: Option<&str>, mount: &str) -> (common::Env, axum::Router) {
    let env = setup(Naming::Classic).await;
    let service = ChinookService::new(env.db.clone(), env.tables.clone());
    let transport = HttpTransport::new(
        service,
        "127.0.0.1",
        0,
        mount,
        AuthConfig::new(token, mount),
    );
    let router = transport.router();
    (env, router)
}

fn mcp_post(path: &str, auth: Option<&str>) -> Request<Body> {
    mcp_post_body(
        path,
        auth,
        json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}),
    )
}

fn mcp_post_body(path: &str, auth: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ACCEPT, "application/json, text/event-stream");
    if let Some(value) = auth {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_is_public() {
    let (_env, app) = router(Some("secret"), "/mcp").await;
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_missing_token_rejected() {
    let (_env, app) = router(Some("secret"), "/mcp").await;
    let response = app.oneshot(mcp_post("/mcp", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    assert_eq!(body_json(response).await, json!({"error": "unauthorized"}));
}

#[tokio::test]
async fn test_wrong_token_rejected() {
    let (_env, app) = router(Some("secret"), "/mcp").await;
    for value in ["Bearer wrong", "secret", "Bearer secret2", "Basic c2VjcmV0"] {
        let response = app
            .clone()
            .oneshot(mcp_post("/mcp", Some(value)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{value}");
    }
}

#[tokio::test]
async fn test_nested_mount_paths_protected() {
    let (_env, app) = router(Some("secret"), "/mcp").await;
    let response = app.oneshot(mcp_post("/mcp/extra", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_correct_token_passes_gate() {
    let (_env, app) = router(Some("secret"), "/mcp").await;
    let response = app
        .oneshot(mcp_post("/mcp", Some("Bearer secret")))
        .await
        .unwrap();
    assert_ne!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_no_token_disables_gate() {
    let (_env, app) = router(None, "/mcp").await;
    let response = app.oneshot(mcp_post("/mcp", None)).await.unwrap();
    assert_ne!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_root_mount_protects_health() {
    let (_env, app) = router(Some("secret"), "/").await;
    let response = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(
            Request::get("/health")
                .header(header::AUTHORIZATION, "Bearer secret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_rejected_tool_call_has_no_side_effects() {
    let (env, app) = router(Some("secret"), "/mcp").await;
    let insert = json!({
        "jsonrpc": "2.0",
        "id": 2,
        "method": "tools/call",
        "params": {
            "name": "insert_customer",
            "arguments": {
                "first_name": "Eva",
                "last_name": "Fonseca",
                "email": "eva@example.com"
            }
        }
    });
    let delete = json!({
        "jsonrpc": "2.0",
        "id": 3,
        "method": "tools/call",
        "params": {
            "name": "run_sql_write",
            "arguments": {"query": "DELETE FROM Scratch"}
        }
    });

    for (auth, body) in [
        (None, insert.clone()),
        (Some("Bearer wrong"), insert),
        (None, delete.clone()),
        (Some("Bearer wrong"), delete),
    ] {
        let response = app
            .clone()
            .oneshot(mcp_post_body("/mcp", auth, body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    assert_eq!(scalar_i64(&env.db, "SELECT COUNT(*) FROM Customer").await, 4);
    assert_eq!(
        scalar_i64(&env.db, "SELECT COUNT(*) FROM Scratch").await,
        common::SCRATCH_ROWS
    );
}

#[tokio::test]
async fn test_schema_resource_reflects_database() {
    let env = setup(Naming::Snake).await;
    let service = ChinookService::new(env.db.clone(), env.tables.clone());

    let result = service
        .read_schema_resource("schema://current")
        .await
        .unwrap();
    assert_eq!(result.contents.len(), 1);
    let (uri, text) = match &result.contents[0] {
        ResourceContents::TextResourceContents { uri, text, .. } => (uri.clone(), text.clone()),
        other => panic!("expected text contents, got {other:?}"),
    };
    assert_eq!(uri, "schema://current");

    let schema: Value = serde_json::from_str(&text).unwrap();
    let names: Vec<&str> = schema["tables"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"customers"));
    assert!(names.contains(&"invoice_items"));
}

#[tokio::test]
async fn test_unknown_resource_uri() {
    let env = setup(Naming::Classic).await;
    let service = ChinookService::new(env.db.clone(), env.tables.clone());

    let err = service
        .read_schema_resource("schema://nope")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::RESOURCE_NOT_FOUND);
}
