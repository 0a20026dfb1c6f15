use axum::routing::get;
use axum::Router;

use crate::handlers::dashboard;
use crate::state::AppState;

/// Routes mounted at `/dashboard`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/overview", get(dashboard::overview))
        .route("/metrics", get(dashboard::metrics))
        .route("/charts/daily", get(dashboard::daily))
        .route("/charts/weekly", get(dashboard::weekly))
        .route("/charts/hourly", get(dashboard::hourly))
        .route("/charts/status", get(dashboard::status))
}
