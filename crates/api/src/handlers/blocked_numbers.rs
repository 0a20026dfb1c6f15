//! Handlers for `/blocked-numbers`: the automation's do-not-contact list.
//!
//! After the table changes the automation's webhook is told about it. That
//! call is best-effort: a failure is logged and does not undo the change.

use axum::extract::{Path, State};
use axum::Json;
use leadboard_core::blocked::{normalize_number, prepare_batch, BatchOutcome, BlockedNumber};
use leadboard_core::legacy::blocked_number_from_row;
use leadboard_events::WebhookTarget;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddNumbersRequest {
    pub numbers: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AddNumbersResponse {
    #[serde(flatten)]
    pub outcome: BatchOutcome,
    pub summary: String,
}

#[derive(Debug, Serialize)]
pub struct RemoveNumberResponse {
    pub number: String,
    pub removed: u64,
}

async fn notify(state: &AppState, target: WebhookTarget, payload: Value) {
    if !state.webhooks.is_configured() {
        return;
    }
    if let Err(e) = state.webhooks.notify(target, &payload).await {
        tracing::warn!(hook = target.as_str(), error = %e, "Blocked-number webhook failed");
    }
}

/// GET /api/v1/blocked-numbers
pub async fn list(
    _user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<BlockedNumber>>>> {
    let rows = state.source.blocked_rows().await?;
    let numbers = rows
        .iter()
        .filter_map(|row| match blocked_number_from_row(row) {
            Ok(n) => Some(n),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping blocked-number row");
                None
            }
        })
        .collect();
    Ok(Json(DataResponse { data: numbers }))
}

/// POST /api/v1/blocked-numbers
///
/// Inserts one number at a time. Numbers already present are skipped;
/// per-number failures are reported alongside the successes.
pub async fn add(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<AddNumbersRequest>,
) -> AppResult<Json<DataResponse<AddNumbersResponse>>> {
    let numbers = prepare_batch(&input.numbers)?;

    let mut outcome = BatchOutcome::default();
    for number in numbers {
        match state.source.blocked_exists(&number).await {
            Ok(true) => {
                outcome.record_skipped(number);
                continue;
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(number = %number, error = %e, "Blocked-number lookup failed");
                outcome.record_failed(number, "lookup failed");
                continue;
            }
        }
        match state.source.insert_blocked(&number).await {
            Ok(_) => outcome.record_added(number),
            Err(e) => {
                tracing::warn!(number = %number, error = %e, "Blocked-number insert failed");
                outcome.record_failed(number, "insert failed");
            }
        }
    }

    if outcome.changed() {
        notify(&state, WebhookTarget::Submit, json!({ "numeros": outcome.added })).await;
    }

    let summary = outcome.summary();
    tracing::info!(
        username = %user.username,
        added = outcome.added.len(),
        skipped = outcome.skipped.len(),
        failed = outcome.failed.len(),
        "Blocked numbers submitted",
    );

    Ok(Json(DataResponse {
        data: AddNumbersResponse { outcome, summary },
    }))
}

/// DELETE /api/v1/blocked-numbers/{number}
pub async fn remove(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> AppResult<Json<DataResponse<RemoveNumberResponse>>> {
    let number = normalize_number(&raw)?;
    let removed = state.source.delete_blocked(&number).await?;

    if removed > 0 {
        notify(&state, WebhookTarget::Delete, json!({ "numero": number })).await;
    }
    tracing::info!(username = %user.username, number = %number, removed, "Blocked number removed");

    Ok(Json(DataResponse {
        data: RemoveNumberResponse { number, removed },
    }))
}
