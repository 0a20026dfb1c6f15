use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::snapshot::{SnapshotKind, SnapshotRefresher};

/// Periodic refresh of one snapshot. The first tick fires immediately, so
/// the snapshot is loaded at startup.
pub struct SnapshotPoller {
    refresher: Arc<SnapshotRefresher>,
    kind: SnapshotKind,
    every: Duration,
}

impl SnapshotPoller {
    pub fn new(refresher: Arc<SnapshotRefresher>, kind: SnapshotKind, every: Duration) -> Self {
        Self {
            refresher,
            kind,
            every,
        }
    }

    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(
            kind = self.kind.as_str(),
            interval_secs = self.every.as_secs(),
            "Snapshot poller started",
        );
        let mut interval = tokio::time::interval(self.every);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(kind = self.kind.as_str(), "Snapshot poller shutting down");
                    break;
                }
                _ = interval.tick() => {
                    match self.refresher.refresh(self.kind).await {
                        Ok(count) => {
                            tracing::debug!(kind = self.kind.as_str(), count, "Scheduled refresh done");
                        }
                        Err(e) => {
                            tracing::error!(
                                kind = self.kind.as_str(),
                                error = %e,
                                "Scheduled refresh failed, keeping previous snapshot",
                            );
                        }
                    }
                }
            }
        }
    }
}
