//! Handlers for `/leads`: the lead table and manual refresh.

use axum::extract::{Query, State};
use axum::Json;
use leadboard_core::error::CoreError;
use leadboard_core::lead::{LeadGroup, LeadRecord, LeadStatus, NameDirectory};
use leadboard_core::phone::{can_view_unmasked, display_phone};
use leadboard_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::{non_blank, PaginationParams};
use crate::response::DataResponse;
use crate::snapshot::SnapshotKind;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct LeadsQuery {
    pub search: Option<String>,
    pub group: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    #[serde(default)]
    pub reveal_phone: bool,
}

/// One row of the leads table.
#[derive(Debug, Serialize)]
pub struct LeadRow {
    pub id: DbId,
    pub remote_jid: Option<String>,
    pub name: Option<String>,
    pub phone: String,
    pub status: LeadStatus,
    pub status_label: &'static str,
    pub created_at: Option<Timestamp>,
    pub last_activity_at: Option<Timestamp>,
    pub last_message: Option<String>,
    pub closed: Option<bool>,
    pub followup1: Option<bool>,
    pub followup2: Option<bool>,
}

impl LeadRow {
    pub fn build(record: &LeadRecord, names: &NameDirectory, reveal_phone: bool) -> Self {
        let status = record.status();
        Self {
            id: record.id,
            remote_jid: record.remote_jid.clone(),
            name: names.lookup(record.remote_jid.as_deref()).map(String::from),
            phone: display_phone(record.remote_jid.as_deref(), reveal_phone),
            status,
            status_label: status.label(),
            created_at: record.created_at,
            last_activity_at: record.last_activity_at,
            last_message: record.last_message.clone(),
            closed: record.closed,
            followup1: record.followup1,
            followup2: record.followup2,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LeadsPage {
    pub fetched_at: Option<Timestamp>,
    /// Records in the snapshot.
    pub total: usize,
    /// Records passing the search and group filters.
    pub matched: usize,
    /// Source rows the adapter could not read.
    pub skipped: usize,
    pub limit: usize,
    pub offset: usize,
    pub items: Vec<LeadRow>,
}

#[derive(Debug, Serialize)]
pub struct RefreshResult {
    pub leads: usize,
    pub names: usize,
}

/// Refuse `reveal_phone` for callers who may not see raw numbers.
pub fn check_reveal(user: &AuthUser, requested: bool) -> Result<bool, CoreError> {
    if requested && !can_view_unmasked(&user.role) {
        return Err(CoreError::Forbidden(
            "Only administrators can see full phone numbers".into(),
        ));
    }
    Ok(requested)
}

/// GET /api/v1/leads
pub async fn list(
    user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<LeadsQuery>,
) -> AppResult<Json<DataResponse<LeadsPage>>> {
    let reveal = check_reveal(&user, query.reveal_phone)?;
    let group = match non_blank(query.group.as_deref()) {
        Some(g) => LeadGroup::from_str_value(g)?,
        None => LeadGroup::All,
    };
    let search = non_blank(query.search.as_deref());
    let page = PaginationParams {
        limit: query.limit,
        offset: query.offset,
    };

    let leads = state.snapshots.leads().await;
    let names = state.snapshots.names().await;

    let matching: Vec<&LeadRecord> = leads
        .records
        .iter()
        .filter(|r| group.matches(r))
        .filter(|r| {
            search
                .map(|s| r.matches_search(s, names.directory.lookup(r.remote_jid.as_deref())))
                .unwrap_or(true)
        })
        .collect();

    let items = matching
        .iter()
        .skip(page.offset())
        .take(page.limit())
        .map(|r| LeadRow::build(r, &names.directory, reveal))
        .collect();

    Ok(Json(DataResponse {
        data: LeadsPage {
            fetched_at: leads.fetched_at,
            total: leads.records.len(),
            matched: matching.len(),
            skipped: leads.skipped,
            limit: page.limit(),
            offset: page.offset(),
            items,
        },
    }))
}

/// POST /api/v1/leads/refresh
///
/// Re-fetch both snapshots now instead of waiting for the pollers.
pub async fn refresh(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<RefreshResult>>> {
    let leads = state.refresher.refresh(SnapshotKind::Leads).await?;
    let names = state.refresher.refresh(SnapshotKind::Names).await?;
    tracing::info!(username = %user.username, leads, names, "Manual snapshot refresh");
    Ok(Json(DataResponse {
        data: RefreshResult { leads, names },
    }))
}
