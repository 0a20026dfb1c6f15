//! Handler for `/leads/export`: CSV and TXT downloads of the lead table.

use axum::extract::{Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use leadboard_core::error::CoreError;
use leadboard_core::export::{
    render, ExportColumn, ExportContext, ExportFilter, ExportFormat, ExportRange, ExportRequest,
};
use leadboard_core::lead::LeadGroup;
use serde::Deserialize;

use crate::error::AppResult;
use crate::handlers::leads::check_reveal;
use crate::middleware::auth::AuthUser;
use crate::query::non_blank;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    /// `csv` (default) or `txt`.
    pub format: Option<String>,
    /// `all`, `7d`, `30d`, `90d` or `custom`.
    pub range: Option<String>,
    pub days: Option<u32>,
    pub group: Option<String>,
    pub search: Option<String>,
    /// Comma-separated column keys.
    pub columns: Option<String>,
    #[serde(default)]
    pub reveal_phone: bool,
}

fn parse_format(value: Option<&str>) -> Result<ExportFormat, CoreError> {
    match value.map(str::to_lowercase).as_deref() {
        None | Some("csv") => Ok(ExportFormat::Csv),
        Some("txt") => Ok(ExportFormat::Txt),
        Some(other) => Err(CoreError::Validation(format!(
            "Unknown export format '{other}'"
        ))),
    }
}

impl ExportQuery {
    pub fn to_request(&self, reveal_phone: bool) -> Result<ExportRequest, CoreError> {
        let group = match non_blank(self.group.as_deref()) {
            Some(g) => LeadGroup::from_str_value(g)?,
            None => LeadGroup::All,
        };
        Ok(ExportRequest {
            filter: ExportFilter {
                range: ExportRange::from_parts(non_blank(self.range.as_deref()), self.days)?,
                group,
                search: non_blank(self.search.as_deref()).map(String::from),
            },
            columns: ExportColumn::parse_list(self.columns.as_deref())?,
            format: parse_format(non_blank(self.format.as_deref()))?,
            reveal_phone,
        })
    }
}

/// GET /api/v1/leads/export
///
/// Renders the filtered snapshot as an attachment. Nothing matching the
/// filters is a 422 `EMPTY_RESULT`, not an empty file.
pub async fn export(
    user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> AppResult<Response> {
    let reveal = check_reveal(&user, query.reveal_phone)?;
    let request = query.to_request(reveal)?;

    let leads = state.snapshots.leads().await;
    let names = state.snapshots.names().await;
    let ctx = ExportContext {
        names: &names.directory,
        offset: state.config.utc_offset,
        now: Utc::now(),
    };

    let artifact = render(&leads.records, &request, ctx)?;
    tracing::info!(
        username = %user.username,
        rows = artifact.row_count,
        file = %artifact.file_name,
        reveal_phone = reveal,
        "Lead export rendered",
    );

    let disposition = format!("attachment; filename=\"{}\"", artifact.file_name);
    Ok((
        [
            (CONTENT_TYPE, artifact.content_type.to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        artifact.body,
    )
        .into_response())
}
