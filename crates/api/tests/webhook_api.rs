//! Webhook pass-through without an upstream configured.

mod common;

use axum::http::StatusCode;
use common::{admin_token, body_json, build_test_app, post_json_auth, viewer_token, InMemorySource};
use serde_json::json;

#[tokio::test]
async fn unconfigured_upstream_is_503() {
    let app = build_test_app(InMemorySource::default());
    for uri in ["/api/v1/webhook", "/api/v1/webhook/delete"] {
        let response = post_json_auth(app.app(), uri, json!({ "numero": "5511999990000" }), &admin_token()).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE, "{uri}");
        let json = body_json(response).await;
        assert_eq!(json["code"], "WEBHOOK_NOT_CONFIGURED");
    }
}

#[tokio::test]
async fn proxy_is_admin_only() {
    let app = build_test_app(InMemorySource::default());
    let response = post_json_auth(app.app(), "/api/v1/webhook", json!({}), &viewer_token()).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
