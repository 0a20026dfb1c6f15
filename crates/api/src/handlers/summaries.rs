//! Handler for `/summaries`: process summaries from the document automation.

use axum::extract::State;
use axum::Json;
use leadboard_core::summary::ProcessSummary;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/summaries
///
/// Newest first. Unreadable rows are logged and left out.
pub async fn list(
    _user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<ProcessSummary>>>> {
    let rows = state.source.summary_rows().await?;
    let summaries = rows
        .iter()
        .filter_map(|row| match ProcessSummary::from_row(row) {
            Ok(s) => Some(s),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping summary row");
                None
            }
        })
        .collect();
    Ok(Json(DataResponse { data: summaries }))
}
