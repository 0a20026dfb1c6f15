use axum::routing::post;
use axum::Router;

use crate::handlers::webhook;
use crate::state::AppState;

/// Routes mounted at `/webhook` (admin only).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(webhook::submit))
        .route("/delete", post(webhook::delete))
}
