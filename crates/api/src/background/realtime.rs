use std::sync::Arc;

use leadboard_events::ChangeEvent;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::snapshot::{SnapshotKind, SnapshotRefresher};

/// Refreshes the affected snapshot when a watched table changes.
pub struct RealtimeRefresher {
    refresher: Arc<SnapshotRefresher>,
    leads_table: String,
    names_table: String,
}

impl RealtimeRefresher {
    /// Table names are unqualified, as they appear in notifications.
    pub fn new(
        refresher: Arc<SnapshotRefresher>,
        leads_table: impl Into<String>,
        names_table: impl Into<String>,
    ) -> Self {
        Self {
            refresher,
            leads_table: leads_table.into(),
            names_table: names_table.into(),
        }
    }

    /// Which snapshot a change affects, if any.
    pub fn kind_for(&self, event: &ChangeEvent) -> Option<SnapshotKind> {
        if event.is_for(&self.leads_table) {
            Some(SnapshotKind::Leads)
        } else if event.is_for(&self.names_table) {
            Some(SnapshotKind::Names)
        } else {
            None
        }
    }

    pub async fn run(&self, mut rx: broadcast::Receiver<ChangeEvent>, cancel: CancellationToken) {
        tracing::info!("Realtime refresher started");

        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => break,
                received = rx.recv() => received,
            };

            match event {
                Ok(event) => {
                    let Some(kind) = self.kind_for(&event) else {
                        continue;
                    };
                    if let Err(e) = self.refresher.refresh(kind).await {
                        tracing::error!(
                            kind = kind.as_str(),
                            table = %event.table,
                            error = %e,
                            "Realtime refresh failed, keeping previous snapshot",
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    // Missed events collapse into one refresh of everything.
                    tracing::warn!(missed, "Realtime refresher lagged");
                    for kind in [SnapshotKind::Leads, SnapshotKind::Names] {
                        if let Err(e) = self.refresher.refresh(kind).await {
                            tracing::error!(kind = kind.as_str(), error = %e, "Catch-up refresh failed");
                        }
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }

        tracing::info!("Realtime refresher shutting down");
    }
}
