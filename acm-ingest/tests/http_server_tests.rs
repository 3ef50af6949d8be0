//! HTTP Server & Routing Integration Tests
//!
//! Drives the router with `tower::ServiceExt::oneshot`; no socket is bound.

mod helpers;

use std::sync::Arc;

use acm_common::EventBus;
use acm_ingest::pipeline::{PipelineConfig, PipelineEngine};
use acm_ingest::services::Ingestor;
use acm_ingest::store::MetadataStore;
use acm_ingest::{build_router, AppState};
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

const MAX_BODY: usize = 1024;

struct TestApp {
    router: Router,
    engine: Arc<PipelineEngine>,
}

fn test_app() -> TestApp {
    let event_bus = EventBus::new(64);
    let engine = Arc::new(
        PipelineEngine::new(
            PipelineConfig::default(),
            helpers::deterministic_transformer(),
            CancellationToken::new(),
            event_bus.clone(),
        )
        .unwrap(),
    );
    engine.start();

    let ingestor = Ingestor::new(Arc::clone(&engine), Arc::new(MetadataStore::new()));
    let state = AppState::new(ingestor, event_bus);

    TestApp {
        router: build_router(state, MAX_BODY),
        engine,
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn upload(query: &str, payload: &'static [u8]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(format!("/upload{}", query))
        .body(Body::from(payload))
        .unwrap()
}

#[tokio::test]
async fn test_upload_returns_metadata() {
    let app = test_app();

    let (status, body) = send(&app.router, upload("?user_id=u1&session_id=s1", b"hello")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["checksum"],
        "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
    );
    assert_eq!(body["user_id"], "u1");
    assert_eq!(body["session_id"], "s1");
    assert_eq!(body["fft"], "5Hz");
    assert_eq!(body["transcript"], "test transcript");
    assert!(body["chunk_id"].as_str().is_some());
    assert!(body["timestamp"].as_str().is_some());
}

#[tokio::test]
async fn test_upload_without_query_uses_empty_ids() {
    let app = test_app();

    let (status, body) = send(&app.router, upload("", b"anon")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], "");
    assert_eq!(body["session_id"], "");
}

#[tokio::test]
async fn test_uploaded_chunk_can_be_fetched() {
    let app = test_app();

    let (_, uploaded) = send(&app.router, upload("?user_id=u1", b"payload")).await;
    let chunk_id = uploaded["chunk_id"].as_str().unwrap();

    let (status, fetched) = send(&app.router, get(&format!("/chunks/{}", chunk_id))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, uploaded);
}

#[tokio::test]
async fn test_unknown_chunk_is_404() {
    let app = test_app();

    let (status, body) = send(
        &app.router,
        get("/chunks/6f1c2a4e-8d0b-4c7e-9a53-0f2b7d9e1c44"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, _) = send(&app.router, get("/chunks/not-a-uuid")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sessions_lists_by_user() {
    let app = test_app();

    send(&app.router, upload("?user_id=u1&session_id=a", b"one")).await;
    send(&app.router, upload("?user_id=u1&session_id=b", b"two")).await;
    send(&app.router, upload("?user_id=u2&session_id=a", b"three")).await;

    let (status, u1) = send(&app.router, get("/sessions/u1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(u1.as_array().unwrap().len(), 2);
    assert!(u1
        .as_array()
        .unwrap()
        .iter()
        .all(|m| m["user_id"] == "u1"));

    let (_, u2) = send(&app.router, get("/sessions/u2")).await;
    assert_eq!(u2.as_array().unwrap().len(), 1);

    let (status, u3) = send(&app.router, get("/sessions/u3")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(u3, Value::Array(Vec::new()));
}

#[tokio::test]
async fn test_upload_after_shutdown_is_503() {
    let app = test_app();
    app.engine.shutdown().await;

    let (status, body) = send(&app.router, upload("?user_id=u1", b"late")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "SHUTTING_DOWN");

    let (_, listed) = send(&app.router, get("/sessions/u1")).await;
    assert_eq!(listed, Value::Array(Vec::new()));
}

#[tokio::test]
async fn test_oversized_upload_rejected() {
    let app = test_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/upload?user_id=u1")
        .body(Body::from(vec![0u8; MAX_BODY + 1]))
        .unwrap();

    let (status, _) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(app.engine.stats().submitted, 0);
}

#[tokio::test]
async fn test_upload_requires_post() {
    let app = test_app();
    let (status, _) = send(&app.router, get("/upload")).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_health_reports_pipeline_and_store() {
    let app = test_app();
    send(&app.router, upload("?user_id=u1", b"one")).await;

    let (status, body) = send(&app.router, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "acm-ingest");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["pipeline"]["queue_capacity"], 100);
    assert_eq!(body["pipeline"]["workers"], 1);
    assert_eq!(body["pipeline"]["submitted"], 1);
    assert_eq!(body["pipeline"]["completed"], 1);
    assert_eq!(body["store"]["records"], 1);
    assert!(body["uptime_seconds"].as_u64().is_some());

    app.engine.shutdown().await;
    let (_, body) = send(&app.router, get("/health")).await;
    assert_eq!(body["status"], "stopping");
}

#[tokio::test]
async fn test_events_endpoint_is_sse() {
    let app = test_app();

    let response = app.router.clone().oneshot(get("/events")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().starts_with("text/event-stream"));
}

#[tokio::test]
async fn test_ws_route_exists() {
    let app = test_app();

    // Plain GET without upgrade headers: the route answers, but refuses
    let response = app.router.clone().oneshot(get("/ws")).await.unwrap();

    assert_ne!(response.status(), StatusCode::NOT_FOUND);
    assert!(!response.status().is_success());
}
