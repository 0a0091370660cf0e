//! API integration tests
//!
//! Drives the real router with a mocked classification backend, so every
//! layer except the external model call is the production code path.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use base64::Engine as _;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use modgate_classify::ClassificationClient;
use modgate_core::{Error, Result};
use modgate_notify::Dispatcher;
use modgate_pipeline::Orchestrator;
use modgate_server::image::ImageFetcher;
use modgate_server::{create_router, AppState};
use modgate_store::MemoryStore;

struct CannedClassifier {
    response: std::result::Result<String, String>,
}

#[async_trait]
impl ClassificationClient for CannedClassifier {
    async fn classify_text(&self, _text: &str) -> Result<String> {
        match &self.response {
            Ok(raw) => Ok(raw.clone()),
            Err(msg) => Err(Error::upstream_unavailable(msg.clone())),
        }
    }

    async fn classify_image(&self, _bytes: &[u8], _mime: &str, _hint: &str) -> Result<String> {
        self.classify_text("").await
    }

    fn name(&self) -> &str {
        "canned"
    }
}

fn app_with_response(response: std::result::Result<String, String>) -> Router {
    let store = Arc::new(MemoryStore::new());
    let orchestrator = Orchestrator::new(
        store.clone(),
        Arc::new(CannedClassifier { response }),
        Arc::new(Dispatcher::new()),
    );

    create_router(AppState {
        orchestrator: Arc::new(orchestrator),
        store,
        fetcher: Arc::new(ImageFetcher::new(1024 * 1024, 5).unwrap()),
        metrics: None,
    })
}

fn harassment_app() -> Router {
    app_with_response(Ok(
        r#"{"classification":"harassment","confidence":0.92,"reasoning":"targeted abuse","flagged":true}"#
            .to_string(),
    ))
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = harassment_app();
    let (status, body) = get_json(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_text_moderation_happy_path() {
    let app = harassment_app();
    let (status, body) = post_json(
        &app,
        "/api/v1/moderate/text",
        json!({
            "email": "user@example.com",
            "text": "You are an idiot and I hope bad things happen to you"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["classification"], "harassment");
    assert_eq!(body["confidence"], 0.92);
    assert!(body["request_id"].as_str().unwrap().starts_with("req_"));
}

#[tokio::test]
async fn test_duplicate_text_is_served_from_cache() {
    let app = harassment_app();
    let body = json!({ "email": "user@example.com", "text": "nasty message" });

    let (_, first) = post_json(&app, "/api/v1/moderate/text", body.clone()).await;
    let (status, second) = post_json(
        &app,
        "/api/v1/moderate/text",
        json!({ "email": "other@example.com", "text": "  NASTY   message " }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["request_id"], first["request_id"]);
    assert!(second["message"].as_str().unwrap().contains("cached"));
}

#[tokio::test]
async fn test_invalid_email_is_rejected() {
    let app = harassment_app();
    let (status, body) = post_json(
        &app,
        "/api/v1/moderate/text",
        json!({ "email": "not-an-email", "text": "hello" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "invalid_input");
}

#[tokio::test]
async fn test_upstream_outage_maps_to_service_unavailable() {
    let app = app_with_response(Err("connect timeout".to_string()));
    let (status, body) = post_json(
        &app,
        "/api/v1/moderate/text",
        json!({ "email": "user@example.com", "text": "anything" }),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "upstream_unavailable");
    // Raw upstream detail stays out of the response body.
    assert!(!body["message"].as_str().unwrap().contains("connect timeout"));
}

#[tokio::test]
async fn test_image_requires_exactly_one_source() {
    let app = harassment_app();

    let (status, body) = post_json(
        &app,
        "/api/v1/moderate/image",
        json!({ "email": "user@example.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_input");

    let (status, _) = post_json(
        &app,
        "/api/v1/moderate/image",
        json!({
            "email": "user@example.com",
            "image_url": "https://example.com/a.png",
            "image_base64": "aGk="
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_inline_image_moderation() {
    let app = harassment_app();
    let png_header: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    let encoded = base64::engine::general_purpose::STANDARD.encode(png_header);

    let (status, body) = post_json(
        &app,
        "/api/v1/moderate/image",
        json!({ "email": "user@example.com", "image_base64": encoded }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["classification"], "harassment");
}

#[tokio::test]
async fn test_unsupported_image_format_is_rejected() {
    let app = harassment_app();
    let encoded = base64::engine::general_purpose::STANDARD.encode(b"definitely not an image");

    let (status, body) = post_json(
        &app,
        "/api/v1/moderate/image",
        json!({ "email": "user@example.com", "image_base64": encoded }),
    )
    .await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["error"], "unsupported_format");
}

#[tokio::test]
async fn test_analytics_summary_reflects_submissions() {
    let app = harassment_app();
    post_json(
        &app,
        "/api/v1/moderate/text",
        json!({ "email": "stats@example.com", "text": "first hostile text" }),
    )
    .await;
    post_json(
        &app,
        "/api/v1/moderate/text",
        json!({ "email": "stats@example.com", "text": "second hostile text" }),
    )
    .await;

    let (status, body) = get_json(&app, "/api/v1/analytics/summary?user=stats@example.com").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_requests"], 2);
    assert_eq!(body["data"]["harassment_content"], 2);
    assert_eq!(body["data"]["flagged_content"], 2);

    let (status, body) = get_json(&app, "/api/v1/analytics/summary/all").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["overall_stats"]["total_requests"], 2);
    assert_eq!(body["overall_stats"]["flag_rate"], 100.0);
}

#[tokio::test]
async fn test_analytics_summary_for_unknown_user_is_empty() {
    let app = harassment_app();
    let (status, body) = get_json(&app, "/api/v1/analytics/summary?user=ghost@example.com").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_requests"], 0);
    assert!(body["message"].as_str().unwrap().contains("No moderation requests"));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = harassment_app();
    let (status, _) = get_json(&app, "/api/v2/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
