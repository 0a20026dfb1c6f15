//! Handlers for `/webhook`: pass-through to the automation's webhooks.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use leadboard_events::WebhookTarget;
use serde_json::Value;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

async fn relay(state: &AppState, target: WebhookTarget, payload: Value) -> AppResult<Response> {
    let upstream = state.webhooks.forward(target, &payload).await?;
    let status = StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::BAD_GATEWAY);
    Ok((status, Json(upstream.body)).into_response())
}

/// POST /api/v1/webhook
///
/// Forward the body to the submission hook and relay its answer.
pub async fn submit(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> AppResult<Response> {
    relay(&state, WebhookTarget::Submit, payload).await
}

/// POST /api/v1/webhook/delete
pub async fn delete(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> AppResult<Response> {
    relay(&state, WebhookTarget::Delete, payload).await
}
