pub mod auth;
pub mod blocked_numbers;
pub mod conversations;
pub mod dashboard;
pub mod health;
pub mod insights;
pub mod leads;
pub mod webhook;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /ws                                      WebSocket (snapshot notices)
///
/// /auth/login                              login (public)
/// /auth/session                            session state (public)
/// /auth/logout                             logout
///
/// /dashboard/overview                      cards + every chart
/// /dashboard/metrics                       metric cards
/// /dashboard/charts/{daily,weekly,hourly,status}
///
/// /leads                                   table rows
/// /leads/refresh                           re-fetch snapshots (POST)
/// /leads/export                            CSV / TXT download
///
/// /conversations                           one card per remote id
/// /conversations/{remote_jid}/messages     message history
///
/// /insights                                cached or computed analytics
/// /insights/refresh                        recompute and store (POST)
///
/// /blocked-numbers                         list, add batch
/// /blocked-numbers/{number}                remove
///
/// /webhook                                 forward to submit hook (POST)
/// /webhook/delete                          forward to delete hook (POST)
///
/// /summaries                               process summaries
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/auth", auth::router())
        .nest("/dashboard", dashboard::router())
        .nest("/leads", leads::router())
        .nest("/conversations", conversations::router())
        .nest("/insights", insights::router())
        .nest("/blocked-numbers", blocked_numbers::router())
        .nest("/webhook", webhook::router())
        .route("/summaries", get(handlers::summaries::list))
}
