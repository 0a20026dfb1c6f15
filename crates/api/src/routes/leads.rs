use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{export, leads};
use crate::state::AppState;

/// Routes mounted at `/leads`.
///
/// ```text
/// GET  /          -> list
/// POST /refresh   -> refresh both snapshots
/// GET  /export    -> CSV / TXT download
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(leads::list))
        .route("/refresh", post(leads::refresh))
        .route("/export", get(export::export))
}
