use axum::routing::{get, post};
use axum::Router;

use crate::handlers::insights;
use crate::state::AppState;

/// Routes mounted at `/insights`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(insights::get))
        .route("/refresh", post(insights::refresh))
}
