//! Handlers for `/conversations`: message-viewer cards and histories.

use axum::extract::{Path, State};
use axum::Json;
use leadboard_core::conversation::{latest_per_conversation, ConversationHistory};
use leadboard_core::error::CoreError;
use leadboard_core::lead::LeadStatus;
use leadboard_core::phone::display_phone;
use leadboard_core::types::{DbId, Timestamp};
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ConversationCard {
    pub id: DbId,
    pub remote_jid: String,
    pub name: Option<String>,
    pub phone: String,
    pub last_message: Option<String>,
    pub last_activity_at: Option<Timestamp>,
    pub status: LeadStatus,
}

/// GET /api/v1/conversations
///
/// One card per remote id, from the lead snapshot.
pub async fn list(
    _user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<ConversationCard>>>> {
    let leads = state.snapshots.leads().await;
    let names = state.snapshots.names().await;

    let cards = latest_per_conversation(&leads.records)
        .into_iter()
        .filter_map(|record| {
            let jid = record.remote_jid.clone()?;
            Some(ConversationCard {
                id: record.id,
                name: names.directory.lookup(Some(jid.as_str())).map(String::from),
                phone: display_phone(Some(jid.as_str()), false),
                remote_jid: jid,
                last_message: record.last_message.clone(),
                last_activity_at: record.last_activity_at,
                status: record.status(),
            })
        })
        .collect();

    Ok(Json(DataResponse { data: cards }))
}

/// GET /api/v1/conversations/{remote_jid}/messages
///
/// Fetched on demand; histories are not part of the snapshots.
pub async fn messages(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(remote_jid): Path<String>,
) -> AppResult<Json<DataResponse<ConversationHistory>>> {
    let remote_jid = remote_jid.trim();
    if remote_jid.is_empty() {
        return Err(CoreError::Validation("remote_jid must not be empty".into()).into());
    }

    let rows = state.source.history_rows(remote_jid).await?;
    let (history, skipped) = ConversationHistory::from_rows(remote_jid, &rows);
    if skipped > 0 {
        tracing::warn!(remote_jid, skipped, "History rows skipped");
    }
    Ok(Json(DataResponse { data: history }))
}
