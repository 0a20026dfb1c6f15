use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::blocked_numbers;
use crate::state::AppState;

/// Routes mounted at `/blocked-numbers`.
///
/// ```text
/// GET    /           -> list
/// POST   /           -> add batch (admin)
/// DELETE /{number}   -> remove (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(blocked_numbers::list).post(blocked_numbers::add),
        )
        .route("/{number}", delete(blocked_numbers::remove))
}
