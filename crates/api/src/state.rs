use std::sync::Arc;

use leadboard_events::{EventBus, WebhookForwarder};

use crate::config::ServerConfig;
use crate::snapshot::{SnapshotRefresher, SnapshotStore};
use crate::source::DashboardSource;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: everything is behind `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool, used directly only by the health check.
    pub pool: leadboard_db::DbPool,
    pub config: Arc<ServerConfig>,
    pub ws_manager: Arc<WsManager>,
    /// Change notifications from the database listener.
    pub event_bus: Arc<EventBus>,
    pub source: Arc<dyn DashboardSource>,
    pub snapshots: Arc<SnapshotStore>,
    pub refresher: Arc<SnapshotRefresher>,
    pub webhooks: Arc<WebhookForwarder>,
}
