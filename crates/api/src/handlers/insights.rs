//! Handlers for `/insights`: conversation analytics.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use leadboard_core::insights::{
    compute, from_analysis_row, group_histories, to_analysis_row, ConversationInsights,
};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

async fn compute_now(state: &AppState) -> AppResult<ConversationInsights> {
    let rows = state.source.all_history_rows().await?;
    let histories = group_histories(&rows);
    let leads = state.snapshots.leads().await;
    Ok(compute(
        &leads.records,
        &histories,
        state.config.utc_offset,
        Utc::now(),
    ))
}

/// GET /api/v1/insights
///
/// The cached analysis row when one exists and reads cleanly, otherwise a
/// fresh computation (not stored).
pub async fn get(
    _user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<ConversationInsights>>> {
    if let Some(row) = state.source.latest_analysis().await? {
        match from_analysis_row(&row) {
            Ok(cached) => return Ok(Json(DataResponse { data: cached })),
            Err(e) => tracing::warn!(error = %e, "Ignoring unreadable cached analysis"),
        }
    }
    let insights = compute_now(&state).await?;
    Ok(Json(DataResponse { data: insights }))
}

/// POST /api/v1/insights/refresh
///
/// Recompute and store the global analysis row.
pub async fn refresh(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<ConversationInsights>>> {
    let insights = compute_now(&state).await?;
    state.source.store_analysis(&to_analysis_row(&insights)).await?;
    tracing::info!(
        username = %user.username,
        conversations = insights.total_conversations,
        "Conversation insights recomputed",
    );
    Ok(Json(DataResponse { data: insights }))
}
