//! HTTP API integration tests
//!
//! Drive the full router with `oneshot` requests; no socket is opened.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use ara_mail_service::config::Settings;
use ara_mail_service::dispatch::EmailDispatcher;
use ara_mail_service::provider::{DeliveryResult, EmailProvider};
use ara_mail_service::render::JinjaTemplateEngine;
use ara_mail_service::server::{create_app, AppState};
use ara_mail_service::template::{MemoryTemplateRepository, Template};

struct StaticProvider;

#[async_trait]
impl EmailProvider for StaticProvider {
    async fn send_email(&self, to: &str, _subject: &str, _content: &str) -> DeliveryResult {
        if to.ends_with("@blocked.example") {
            DeliveryResult::failed("recipient suppressed")
        } else {
            DeliveryResult::delivered("static-1")
        }
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

fn app() -> Router {
    let settings: Settings = serde_json::from_value(json!({})).unwrap();
    let repository = Arc::new(
        MemoryTemplateRepository::with_templates(vec![
            Template::new("welcome", "Hi {{name}}", "Welcome, {{name}}!"),
            Template::new("broken", "Hi {{name}}", "Welcome, {{ name"),
        ])
        .unwrap(),
    );
    let dispatcher = Arc::new(EmailDispatcher::new(
        repository,
        Arc::new(JinjaTemplateEngine::new()),
        Arc::new(StaticProvider),
    ));
    create_app(AppState::new(settings, dispatcher, None))
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

#[tokio::test]
async fn test_send_returns_delivery_result() {
    let (status, body) = post_json(
        app(),
        "/api/v1/emails/send",
        json!({ "recipient": "ana@example.com", "templateId": "welcome", "data": { "name": "Ana" } }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "messageId": "static-1" }));
}

#[tokio::test]
async fn test_send_failures_are_still_ok_responses() {
    let (status, body) = post_json(
        app(),
        "/api/v1/emails/send",
        json!({ "recipient": "ana@example.com", "templateId": "nope" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "success": false, "error": "template not found: nope" })
    );

    let (status, body) = post_json(
        app(),
        "/api/v1/emails/send",
        json!({ "recipient": "ana@blocked.example", "templateId": "welcome" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "recipient suppressed");
}

#[tokio::test]
async fn test_send_rejects_blank_fields() {
    let (status, body) = post_json(
        app(),
        "/api/v1/emails/send",
        json!({ "recipient": "  ", "templateId": "welcome" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_preview_renders_without_sending() {
    let (status, body) = post_json(
        app(),
        "/api/v1/emails/preview",
        json!({ "templateId": "welcome", "data": { "name": "Ana" } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "subject": "Hi Ana", "body": "Welcome, Ana!" }));

    let (status, body) = post_json(
        app(),
        "/api/v1/emails/preview",
        json!({ "templateId": "nope" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "TEMPLATE_NOT_FOUND");
}

#[tokio::test]
async fn test_preview_of_malformed_template_is_unprocessable() {
    let (status, body) = post_json(
        app(),
        "/api/v1/emails/preview",
        json!({ "templateId": "broken", "data": { "name": "Ana" } }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "RENDER_ERROR");
    assert!(body["error"]["message"].as_str().unwrap().contains("line 1"));
}

#[tokio::test]
async fn test_health_and_stats() {
    let (status, body) = get(app(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    let health: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["provider"], "static");
    assert_eq!(health["template_backend"], "memory");
    assert!(health.get("postgres").is_none());

    let (status, body) = get(app(), "/stats").await;
    assert_eq!(status, StatusCode::OK);
    let stats: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(stats["dispatch"]["total_requests"], 0);
}

#[tokio::test]
async fn test_metrics_endpoint_serves_text() {
    // Make sure at least one dispatch counter exists
    post_json(
        app(),
        "/api/v1/emails/send",
        json!({ "recipient": "ana@example.com", "templateId": "welcome" }),
    )
    .await;

    let (status, body) = get(app(), "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("ara_mail_dispatch_total"));
}
