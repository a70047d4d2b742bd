use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use orgdesk_api::shared_state::InnerState;
use orgdesk_auth::{memory::MemoryStore, PermissionEvaluator, PermissionRegistry};
use serde_json::Value;
use tower::ServiceExt;

/// Nothing listens here, so any handler that gets past its permission check fails with 503
/// when it asks the pool for a connection. A 403 from the same route shows the check ran first.
const UNREACHABLE_DB: &str = "postgres://nobody@127.0.0.1:1/none";

/// The full middleware stack with permissions and sessions served from memory.
pub fn guard_app(store: Arc<MemoryStore>) -> Router {
    app_with_mode(store, false)
}

/// Like `guard_app`, but with error bodies obfuscated the way a production server does.
pub fn production_app(store: Arc<MemoryStore>) -> Router {
    app_with_mode(store, true)
}

fn app_with_mode(store: Arc<MemoryStore>, production: bool) -> Router {
    orgdesk_test::init_tracing();

    let db = orgdesk_db::connect(UNREACHABLE_DB, 1).expect("building pool");
    let state = Arc::new(InnerState {
        production,
        db,
        evaluator: PermissionEvaluator::new(store.clone()),
        registry: PermissionRegistry::new(store.clone()),
    });

    orgdesk_api::build_app(state, store)
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let req = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("building request");

    let res = app.clone().oneshot(req).await.expect("sending request");
    let status = res.status();
    let bytes = hyper::body::to_bytes(res.into_body())
        .await
        .expect("reading body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, json)
}

pub fn error_kind(body: &Value) -> &str {
    body["error"]["kind"].as_str().unwrap_or_default()
}
