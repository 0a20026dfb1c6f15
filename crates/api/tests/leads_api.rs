//! Lead table listing, filtering, and manual refresh.

mod common;

use std::sync::atomic::Ordering;

use axum::http::StatusCode;
use common::{
    admin_token, body_json, build_test_app, get_auth, lead_row, post_auth, ten_leads, token_for,
    viewer_token, InMemorySource,
};
use serde_json::json;

#[tokio::test]
async fn lists_every_lead_with_masked_phones() {
    let app = build_test_app(InMemorySource::with_leads(ten_leads()));
    app.load_snapshots().await;

    let response = get_auth(app.app(), "/api/v1/leads", &viewer_token()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let page = &json["data"];
    assert_eq!(page["total"], 10);
    assert_eq!(page["matched"], 10);
    assert_eq!(page["skipped"], 0);
    assert_eq!(page["items"].as_array().unwrap().len(), 10);

    let first = &page["items"][0];
    assert_eq!(first["id"], 1);
    assert_eq!(first["phone"], "+55 (11) *****-**00");
    assert_eq!(first["status"], "closed");
}

#[tokio::test]
async fn group_and_search_filters_narrow_the_page() {
    let app = build_test_app(InMemorySource::with_leads(ten_leads()));
    app.load_snapshots().await;

    let json = body_json(get_auth(app.app(), "/api/v1/leads?group=closed", &viewer_token()).await).await;
    assert_eq!(json["data"]["matched"], 3);

    let json = body_json(get_auth(app.app(), "/api/v1/leads?group=active", &viewer_token()).await).await;
    assert_eq!(json["data"]["matched"], 7);

    let json = body_json(get_auth(app.app(), "/api/v1/leads?group=followup2", &viewer_token()).await).await;
    assert_eq!(json["data"]["matched"], 2);

    let json = body_json(get_auth(app.app(), "/api/v1/leads?search=5511999900007", &viewer_token()).await).await;
    assert_eq!(json["data"]["matched"], 1);
    assert_eq!(json["data"]["items"][0]["id"], 8);
}

#[tokio::test]
async fn search_matches_display_names() {
    let source = InMemorySource::with_leads(ten_leads());
    *source.names.lock().unwrap() = vec![json!({
        "id": 1,
        "remotejID": "5511999900004@s.whatsapp.net",
        "nome": "Maria Souza",
    })];
    let app = build_test_app(source);
    app.load_snapshots().await;

    let json = body_json(get_auth(app.app(), "/api/v1/leads?search=souza", &viewer_token()).await).await;
    assert_eq!(json["data"]["matched"], 1);
    assert_eq!(json["data"]["items"][0]["name"], "Maria Souza");
}

#[tokio::test]
async fn pagination_is_applied_after_filtering() {
    let app = build_test_app(InMemorySource::with_leads(ten_leads()));
    app.load_snapshots().await;

    let json = body_json(get_auth(app.app(), "/api/v1/leads?limit=3&offset=8", &viewer_token()).await).await;
    assert_eq!(json["data"]["matched"], 10);
    assert_eq!(json["data"]["limit"], 3);
    assert_eq!(json["data"]["offset"], 8);
    assert_eq!(json["data"]["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn unknown_group_is_a_validation_error() {
    let app = build_test_app(InMemorySource::with_leads(ten_leads()));
    let response = get_auth(app.app(), "/api/v1/leads?group=archived", &viewer_token()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn only_admins_may_reveal_phones() {
    let app = build_test_app(InMemorySource::with_leads(ten_leads()));
    app.load_snapshots().await;

    let response = get_auth(app.app(), "/api/v1/leads?reveal_phone=true", &viewer_token()).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let service = token_for("integration", "service_role");
    let response = get_auth(app.app(), "/api/v1/leads?reveal_phone=true", &service).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get_auth(app.app(), "/api/v1/leads?reveal_phone=true", &admin_token()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["items"][0]["phone"], "5511999900000");
}

#[tokio::test]
async fn refresh_picks_up_new_rows() {
    let app = build_test_app(InMemorySource::with_leads(ten_leads()));
    app.load_snapshots().await;

    app.source.leads.lock().unwrap().push(lead_row(
        11,
        "5521988887777",
        "2024-03-12T08:00:00Z",
        None,
        None,
        None,
    ));

    let response = post_auth(app.app(), "/api/v1/leads/refresh", &viewer_token()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["leads"], 11);
    assert_eq!(json["data"]["names"], 0);

    let json = body_json(get_auth(app.app(), "/api/v1/leads", &viewer_token()).await).await;
    assert_eq!(json["data"]["total"], 11);
}

#[tokio::test]
async fn failed_refresh_keeps_the_previous_snapshot() {
    let app = build_test_app(InMemorySource::with_leads(ten_leads()));
    app.load_snapshots().await;
    app.source.offline.store(true, Ordering::SeqCst);

    let response = post_auth(app.app(), "/api/v1/leads/refresh", &viewer_token()).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_json(response).await;
    assert_eq!(json["code"], "DATABASE_UNAVAILABLE");

    let json = body_json(get_auth(app.app(), "/api/v1/leads", &viewer_token()).await).await;
    assert_eq!(json["data"]["total"], 10);
}

#[tokio::test]
async fn malformed_rows_are_skipped_not_fatal() {
    let mut rows = ten_leads();
    rows.push(json!({ "remotejID": "no-id@s.whatsapp.net" }));
    let app = build_test_app(InMemorySource::with_leads(rows));
    app.load_snapshots().await;

    let json = body_json(get_auth(app.app(), "/api/v1/leads", &viewer_token()).await).await;
    assert_eq!(json["data"]["total"], 10);
    assert_eq!(json["data"]["skipped"], 1);
}
