//! Handlers for `/dashboard`: metric cards and chart series.
//!
//! Everything is computed from the current lead snapshot on each request.

use axum::extract::{Query, State};
use axum::Json;
use leadboard_core::aggregate::{
    daily_series, hourly_histogram, weekly_series, DailyBucket, DashboardOverview, HourlyBucket,
    MetricsSummary, OverviewParams, StatusDistribution, StatusSlice, TimeBasis, WeeklyBucket,
    DEFAULT_DAILY_WINDOW, DEFAULT_WEEKS, MAX_DAILY_WINDOW, MAX_WEEKS,
};
use leadboard_core::error::CoreError;
use leadboard_core::types::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// `?days=&weeks=&basis=` shared by the chart endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ChartQuery {
    pub days: Option<usize>,
    pub weeks: Option<usize>,
    pub basis: Option<TimeBasis>,
}

impl ChartQuery {
    pub fn params(&self, state: &AppState) -> Result<OverviewParams, CoreError> {
        let days = self.days.unwrap_or(DEFAULT_DAILY_WINDOW);
        if !(1..=MAX_DAILY_WINDOW).contains(&days) {
            return Err(CoreError::Validation(format!(
                "'days' must be between 1 and {MAX_DAILY_WINDOW}"
            )));
        }
        let weeks = self.weeks.unwrap_or(DEFAULT_WEEKS);
        if !(1..=MAX_WEEKS).contains(&weeks) {
            return Err(CoreError::Validation(format!(
                "'weeks' must be between 1 and {MAX_WEEKS}"
            )));
        }
        Ok(OverviewParams {
            basis: self.basis.unwrap_or_default(),
            offset: state.config.utc_offset,
            days,
            weeks,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct OverviewResponse {
    /// When the lead snapshot was fetched; `None` before the first fetch.
    pub fetched_at: Option<Timestamp>,
    #[serde(flatten)]
    pub overview: DashboardOverview,
}

/// GET /api/v1/dashboard/overview
pub async fn overview(
    _user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ChartQuery>,
) -> AppResult<Json<DataResponse<OverviewResponse>>> {
    let params = query.params(&state)?;
    let snapshot = state.snapshots.leads().await;
    Ok(Json(DataResponse {
        data: OverviewResponse {
            fetched_at: snapshot.fetched_at,
            overview: DashboardOverview::build(&snapshot.records, params),
        },
    }))
}

/// GET /api/v1/dashboard/metrics
pub async fn metrics(
    _user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<MetricsSummary>>> {
    let snapshot = state.snapshots.leads().await;
    Ok(Json(DataResponse {
        data: MetricsSummary::from_records(&snapshot.records),
    }))
}

/// GET /api/v1/dashboard/charts/daily
pub async fn daily(
    _user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ChartQuery>,
) -> AppResult<Json<DataResponse<Vec<DailyBucket>>>> {
    let params = query.params(&state)?;
    let snapshot = state.snapshots.leads().await;
    Ok(Json(DataResponse {
        data: daily_series(&snapshot.records, params.basis, params.offset, params.days),
    }))
}

/// GET /api/v1/dashboard/charts/weekly
pub async fn weekly(
    _user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ChartQuery>,
) -> AppResult<Json<DataResponse<Vec<WeeklyBucket>>>> {
    let params = query.params(&state)?;
    let snapshot = state.snapshots.leads().await;
    Ok(Json(DataResponse {
        data: weekly_series(&snapshot.records, params.basis, params.offset, params.weeks),
    }))
}

/// GET /api/v1/dashboard/charts/hourly
pub async fn hourly(
    _user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ChartQuery>,
) -> AppResult<Json<DataResponse<Vec<HourlyBucket>>>> {
    let params = query.params(&state)?;
    let snapshot = state.snapshots.leads().await;
    Ok(Json(DataResponse {
        data: hourly_histogram(&snapshot.records, params.basis, params.offset),
    }))
}

/// GET /api/v1/dashboard/charts/status
pub async fn status(
    _user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<StatusSlice>>>> {
    let snapshot = state.snapshots.leads().await;
    Ok(Json(DataResponse {
        data: StatusDistribution::from_records(&snapshot.records).slices(),
    }))
}
