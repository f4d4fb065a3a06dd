//! Router-level tests driving the gateway through `tower::ServiceExt`.

#![allow(clippy::panic)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use pos_offline_gateway::api::build_app;
use pos_offline_gateway::app_state::AppState;
use pos_offline_gateway::domain::timestamp::format_storage;
use pos_offline_gateway::domain::{OfflineEventType, SessionId, UserId};
use pos_offline_gateway::persistence::{IdentityDirectory, LogStore, MemoryStore};
use pos_offline_gateway::service::OfflineLogService;

const OPERATOR_TOKEN: &str = "operator-token";
const CLERK_TOKEN: &str = "clerk-token";

async fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.add_user(UserId::new(5), "cashier", true).await;
    store.add_user(UserId::new(6), "clerk", false).await;
    store.add_session(SessionId::new(1)).await;
    if store.add_token(OPERATOR_TOKEN, UserId::new(5)).await.is_err()
        || store.add_token(CLERK_TOKEN, UserId::new(6)).await.is_err()
    {
        panic!("token seeding failed");
    }
    store
}

fn app(store: &Arc<MemoryStore>, static_dir: &Path) -> Router {
    let log_store: Arc<dyn LogStore> = Arc::clone(store) as Arc<dyn LogStore>;
    let directory: Arc<dyn IdentityDirectory> = Arc::clone(store) as Arc<dyn IdentityDirectory>;
    let state = AppState {
        log_service: Arc::new(OfflineLogService::new(log_store)),
        directory,
        static_dir: Arc::new(static_dir.to_path_buf()),
    };
    build_app(state, Duration::from_secs(5))
}

fn batch_request(token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/v1/offline-logs/batch")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let Ok(request) = builder.body(Body::from(body.to_string())) else {
        panic!("request build failed");
    };
    request
}

fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let Ok(request) = builder.body(Body::empty()) else {
        panic!("request build failed");
    };
    request
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let Ok(response) = app.oneshot(request).await else {
        panic!("router failed");
    };
    let status = response.status();
    let headers = response.headers().clone();
    let Ok(body) = to_bytes(response.into_body(), usize::MAX).await else {
        panic!("body read failed");
    };
    (status, headers, body.to_vec())
}

fn json_body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap_or(Value::Null)
}

#[tokio::test]
async fn end_to_end_batch_stores_only_valid_entry() {
    let store = seeded_store().await;
    let Ok(dir) = tempfile::tempdir() else {
        panic!("tempdir failed");
    };
    let body = json!({"logs": [
        {
            "session": 1,
            "user": 5,
            "eventType": "network_lost",
            "timestamp": "2024-01-01T10:00:00.000Z",
        },
        {"session": 1, "user": 5, "eventType": "bad"},
    ]});

    let (status, _, bytes) = send(
        app(&store, dir.path()),
        batch_request(Some(OPERATOR_TOKEN), &body),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&bytes), json!({"result": true}));

    let entries = store.all_entries().await;
    assert_eq!(entries.len(), 1);
    let Some(entry) = entries.first() else {
        panic!("nothing stored");
    };
    assert_eq!(format_storage(&entry.timestamp), "2024-01-01 10:00:00");
    assert_eq!(entry.event_type, OfflineEventType::NetworkLost);
    assert_eq!(entry.session_id, SessionId::new(1));
    assert_eq!(entry.user_id, UserId::new(5));
}

#[tokio::test]
async fn caller_without_capability_gets_false() {
    let store = seeded_store().await;
    let Ok(dir) = tempfile::tempdir() else {
        panic!("tempdir failed");
    };
    let body = json!({"logs": [
        {"session_id": 1, "user_id": 6, "event_type": "attempted_close"},
    ]});

    let (status, _, bytes) = send(
        app(&store, dir.path()),
        batch_request(Some(CLERK_TOKEN), &body),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&bytes), json!({"result": false}));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn all_malformed_batch_is_true_with_no_rows() {
    let store = seeded_store().await;
    let Ok(dir) = tempfile::tempdir() else {
        panic!("tempdir failed");
    };
    let body = json!({"logs": [
        {"user_id": 5, "event_type": "network_lost"},
        {
            "session_id": 1,
            "user_id": 5,
            "event_type": "network_lost",
            "timestamp": "2024-01-01T10:00:00Z",
        },
    ]});

    let (status, _, bytes) = send(
        app(&store, dir.path()),
        batch_request(Some(OPERATOR_TOKEN), &body),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&bytes), json!({"result": true}));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn unknown_session_raises_and_stores_nothing() {
    let store = seeded_store().await;
    let Ok(dir) = tempfile::tempdir() else {
        panic!("tempdir failed");
    };
    let body = json!({"logs": [
        {"session_id": 1, "user_id": 5, "event_type": "network_lost"},
        {"session_id": 999, "user_id": 5, "event_type": "network_recovered"},
    ]});

    let (status, _, bytes) = send(
        app(&store, dir.path()),
        batch_request(Some(OPERATOR_TOKEN), &body),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_body(&bytes)["error"]["code"], 3002);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn missing_token_is_unauthenticated() {
    let store = seeded_store().await;
    let Ok(dir) = tempfile::tempdir() else {
        panic!("tempdir failed");
    };
    let body = json!({"logs": []});

    let (status, _, _) = send(app(&store, dir.path()), batch_request(None, &body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = send(app(&store, dir.path()), batch_request(Some("nope"), &body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn loosely_formatted_timestamps_are_skipped() {
    let store = seeded_store().await;
    let Ok(dir) = tempfile::tempdir() else {
        panic!("tempdir failed");
    };
    let body = json!({"logs": [
        {
            "session_id": 1,
            "user_id": 5,
            "event_type": "network_lost",
            "timestamp": "2024-01-01T23:59:60.000Z",
        },
        {
            "session_id": 1,
            "user_id": 5,
            "event_type": "network_lost",
            "timestamp": "+2024-01-01T10:00:00.000Z",
        },
        {
            "session_id": 1,
            "user_id": 5,
            "event_type": "network_recovered",
            "timestamp": "2024-01-01T10:05:00.000Z",
        },
    ]});

    let (status, _, bytes) = send(
        app(&store, dir.path()),
        batch_request(Some(OPERATOR_TOKEN), &body),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&bytes), json!({"result": true}));

    let entries = store.all_entries().await;
    assert_eq!(entries.len(), 1);
    let Some(entry) = entries.first() else {
        panic!("nothing stored");
    };
    assert_eq!(entry.event_type, OfflineEventType::NetworkRecovered);
    assert_eq!(format_storage(&entry.timestamp), "2024-01-01 10:05:00");
}

#[tokio::test]
async fn malformed_body_is_structured_bad_request() {
    let store = seeded_store().await;
    let Ok(dir) = tempfile::tempdir() else {
        panic!("tempdir failed");
    };
    let Ok(request) = Request::builder()
        .method("POST")
        .uri("/api/v1/offline-logs/batch")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {OPERATOR_TOKEN}"))
        .body(Body::from("{\"logs\": [")) else {
        panic!("request build failed");
    };

    let (status, _, bytes) = send(app(&store, dir.path()), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&bytes)["error"]["code"], 1001);

    let (status, _, bytes) = send(
        app(&store, dir.path()),
        batch_request(Some(OPERATOR_TOKEN), &json!({"entries": []})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&bytes)["error"]["code"], 1001);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn malformed_listing_query_is_structured_bad_request() {
    let store = seeded_store().await;
    let Ok(dir) = tempfile::tempdir() else {
        panic!("tempdir failed");
    };
    let (status, _, bytes) = send(
        app(&store, dir.path()),
        get_request("/api/v1/offline-logs?page=abc", Some(OPERATOR_TOKEN)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&bytes)["error"]["code"], 1001);
}

#[tokio::test]
async fn listing_is_ordered_filtered_and_paged() {
    let store = seeded_store().await;
    let Ok(dir) = tempfile::tempdir() else {
        panic!("tempdir failed");
    };
    let body = json!({"logs": [
        {
            "session_id": 1,
            "user_id": 5,
            "event_type": "network_recovered",
            "timestamp": "2024-01-01T11:00:00.000Z",
        },
        {
            "session_id": 1,
            "user_id": 5,
            "event_type": "network_lost",
            "timestamp": "2024-01-01T10:00:00.000Z",
        },
        {
            "session_id": 1,
            "user_id": 5,
            "event_type": "network_lost",
            "timestamp": "2024-01-01T12:00:00.000Z",
        },
    ]});
    let (status, _, _) = send(
        app(&store, dir.path()),
        batch_request(Some(OPERATOR_TOKEN), &body),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, bytes) = send(
        app(&store, dir.path()),
        get_request("/api/v1/offline-logs", Some(OPERATOR_TOKEN)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let listing = json_body(&bytes);
    let timestamps: Vec<&str> = listing["data"]
        .as_array()
        .map(|rows| rows.iter().filter_map(|r| r["timestamp"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(
        timestamps,
        vec!["2024-01-01 10:00:00", "2024-01-01 11:00:00", "2024-01-01 12:00:00"]
    );

    let (_, _, bytes) = send(
        app(&store, dir.path()),
        get_request(
            "/api/v1/offline-logs?event_type=network_lost&per_page=1&page=2",
            Some(OPERATOR_TOKEN),
        ),
    )
    .await;
    let page = json_body(&bytes);
    assert_eq!(page["pagination"]["total"], 2);
    assert_eq!(page["pagination"]["total_pages"], 2);
    assert_eq!(page["data"][0]["timestamp"], "2024-01-01 12:00:00");
}

#[tokio::test]
async fn listing_forbidden_for_non_operator() {
    let store = seeded_store().await;
    let Ok(dir) = tempfile::tempdir() else {
        panic!("tempdir failed");
    };
    let (status, _, _) = send(
        app(&store, dir.path()),
        get_request("/api/v1/offline-logs", Some(CLERK_TOKEN)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn service_worker_served_with_scope_header() {
    let store = seeded_store().await;
    let Ok(dir) = tempfile::tempdir() else {
        panic!("tempdir failed");
    };
    let script = "self.addEventListener('fetch', () => {});\n";
    if std::fs::write(dir.path().join("pos_sw.js"), script).is_err() {
        panic!("fixture write failed");
    }

    let (status, headers, bytes) = send(
        app(&store, dir.path()),
        get_request("/pos_sw.js", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers.get("service-worker-allowed").and_then(|v| v.to_str().ok()),
        Some("/")
    );
    assert_eq!(
        headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()),
        Some("application/javascript")
    );
    assert_eq!(
        headers.get(header::CACHE_CONTROL).and_then(|v| v.to_str().ok()),
        Some("public, max-age=3600")
    );
    assert_eq!(bytes, script.as_bytes());
}

#[tokio::test]
async fn missing_service_worker_is_not_found() {
    let store = seeded_store().await;
    let Ok(dir) = tempfile::tempdir() else {
        panic!("tempdir failed");
    };

    let (status, headers, _) = send(app(&store, dir.path()), get_request("/pos_sw.js", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(headers.get("service-worker-allowed").is_none());
}

#[tokio::test]
async fn event_type_catalog_lists_all_types() {
    let store = seeded_store().await;
    let Ok(dir) = tempfile::tempdir() else {
        panic!("tempdir failed");
    };

    let (status, _, bytes) = send(
        app(&store, dir.path()),
        get_request("/config/event-types", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<String> = json_body(&bytes)
        .as_array()
        .map(|rows| {
            rows.iter()
                .filter_map(|r| r["event_type"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    assert_eq!(
        names,
        vec!["attempted_close", "accepted_close", "network_lost", "network_recovered"]
    );
}

#[tokio::test]
async fn health_reports_healthy() {
    let store = seeded_store().await;
    let Ok(dir) = tempfile::tempdir() else {
        panic!("tempdir failed");
    };

    let (status, _, bytes) = send(app(&store, dir.path()), get_request("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&bytes)["status"], "healthy");
}
