use axum::routing::get;
use axum::Router;

use crate::handlers::conversations;
use crate::state::AppState;

/// Routes mounted at `/conversations`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(conversations::list))
        .route("/{remote_jid}/messages", get(conversations::messages))
}
