use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use leadboard_api::background::{RealtimeRefresher, SnapshotPoller};
use leadboard_api::config::ServerConfig;
use leadboard_api::router::build_app_router;
use leadboard_api::snapshot::{SnapshotKind, SnapshotRefresher, SnapshotStore};
use leadboard_api::source::{DashboardSource, PgDashboardSource};
use leadboard_api::state::AppState;
use leadboard_api::ws;
use leadboard_events::{ChangeListener, EventBus, WebhookForwarder};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "leadboard_api=debug,leadboard_events=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        users = config.users.len(),
        leads_table = %config.tables.leads.as_str(),
        realtime = config.realtime_channel.is_some(),
        webhooks = config.webhook.base_url.is_some(),
        "Loaded server configuration",
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = leadboard_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    leadboard_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    // --- WebSocket manager ---
    let ws_manager = Arc::new(ws::WsManager::new());
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager));

    // --- Snapshots ---
    let source: Arc<dyn DashboardSource> =
        Arc::new(PgDashboardSource::new(pool.clone(), config.tables.clone()));
    let snapshots = Arc::new(SnapshotStore::new());
    let refresher = Arc::new(SnapshotRefresher::new(
        Arc::clone(&source),
        Arc::clone(&snapshots),
        Arc::clone(&ws_manager),
    ));

    // --- Webhooks ---
    let webhooks = Arc::new(
        WebhookForwarder::new(
            config.webhook.base_url.clone(),
            config.webhook.submit_path.clone(),
            config.webhook.delete_path.clone(),
            Duration::from_secs(config.webhook.timeout_secs),
        )
        .expect("Failed to build webhook HTTP client"),
    );

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());

    // --- Background tasks ---
    let cancel = CancellationToken::new();
    let mut task_handles = Vec::new();

    for (kind, secs) in [
        (SnapshotKind::Leads, config.leads_poll_secs),
        (SnapshotKind::Names, config.names_poll_secs),
    ] {
        let poller = SnapshotPoller::new(Arc::clone(&refresher), kind, Duration::from_secs(secs));
        let token = cancel.clone();
        task_handles.push(tokio::spawn(async move { poller.run(token).await }));
    }

    if let Some(channel) = config.realtime_channel.clone() {
        let listener = ChangeListener::new(pool.clone(), channel, Arc::clone(&event_bus));
        let token = cancel.clone();
        task_handles.push(tokio::spawn(async move { listener.run(token).await }));

        let realtime = RealtimeRefresher::new(
            Arc::clone(&refresher),
            config.tables.leads.bare(),
            config.tables.names.bare(),
        );
        let rx = event_bus.subscribe();
        let token = cancel.clone();
        task_handles.push(tokio::spawn(async move { realtime.run(rx, token).await }));
    } else {
        tracing::info!("REALTIME_CHANNEL not set, relying on polling only");
    }
    tracing::info!(tasks = task_handles.len(), "Background tasks started");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        ws_manager: Arc::clone(&ws_manager),
        event_bus: Arc::clone(&event_bus),
        source,
        snapshots,
        refresher,
        webhooks,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();
    let drain = futures::future::join_all(task_handles);
    if tokio::time::timeout(Duration::from_secs(config.shutdown_timeout_secs), drain)
        .await
        .is_err()
    {
        tracing::warn!("Background tasks did not stop in time");
    }
    tracing::info!("Background tasks stopped");

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    heartbeat_handle.abort();
    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
