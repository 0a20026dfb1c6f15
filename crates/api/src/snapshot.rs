//! In-memory snapshots of the lead and display-name tables.
//!
//! Each snapshot is replaced whole on refresh. Concurrent refreshes are not
//! coordinated: whichever finishes last wins. A failed refresh leaves the
//! previous snapshot in place.

use std::sync::Arc;

use axum::extract::ws::Message;
use chrono::Utc;
use leadboard_core::lead::{LeadRecord, NameDirectory};
use leadboard_core::legacy::{display_name_from_row, leads_from_rows};
use leadboard_core::types::Timestamp;
use serde::Serialize;
use serde_json::json;
use tokio::sync::RwLock;

use crate::error::AppResult;
use crate::source::DashboardSource;
use crate::ws::WsManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotKind {
    Leads,
    Names,
}

impl SnapshotKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SnapshotKind::Leads => "leads",
            SnapshotKind::Names => "names",
        }
    }
}

#[derive(Debug, Default)]
pub struct LeadSnapshot {
    pub records: Vec<LeadRecord>,
    /// Rows the legacy adapter could not read.
    pub skipped: usize,
    /// `None` until the first successful fetch.
    pub fetched_at: Option<Timestamp>,
}

#[derive(Debug, Default)]
pub struct NameSnapshot {
    pub directory: NameDirectory,
    pub fetched_at: Option<Timestamp>,
}

/// Latest snapshots, shared via `Arc<SnapshotStore>`.
#[derive(Default)]
pub struct SnapshotStore {
    leads: RwLock<Arc<LeadSnapshot>>,
    names: RwLock<Arc<NameSnapshot>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn leads(&self) -> Arc<LeadSnapshot> {
        self.leads.read().await.clone()
    }

    pub async fn names(&self) -> Arc<NameSnapshot> {
        self.names.read().await.clone()
    }

    pub async fn replace_leads(&self, snapshot: LeadSnapshot) {
        *self.leads.write().await = Arc::new(snapshot);
    }

    pub async fn replace_names(&self, snapshot: NameSnapshot) {
        *self.names.write().await = Arc::new(snapshot);
    }
}

/// Fetches, replaces, and tells connected browsers.
pub struct SnapshotRefresher {
    source: Arc<dyn DashboardSource>,
    store: Arc<SnapshotStore>,
    ws_manager: Arc<WsManager>,
}

impl SnapshotRefresher {
    pub fn new(
        source: Arc<dyn DashboardSource>,
        store: Arc<SnapshotStore>,
        ws_manager: Arc<WsManager>,
    ) -> Self {
        Self {
            source,
            store,
            ws_manager,
        }
    }

    /// Re-fetch one snapshot. Returns how many entries it now holds.
    pub async fn refresh(&self, kind: SnapshotKind) -> AppResult<usize> {
        let count = match kind {
            SnapshotKind::Leads => self.refresh_leads().await?,
            SnapshotKind::Names => self.refresh_names().await?,
        };
        self.notify(kind).await;
        Ok(count)
    }

    async fn refresh_leads(&self) -> AppResult<usize> {
        let rows = self.source.lead_rows().await?;
        let (records, skipped) = leads_from_rows(&rows);
        if skipped > 0 {
            tracing::warn!(skipped, "Lead rows skipped by the legacy adapter");
        }
        let count = records.len();
        self.store
            .replace_leads(LeadSnapshot {
                records,
                skipped,
                fetched_at: Some(Utc::now()),
            })
            .await;
        tracing::debug!(count, "Lead snapshot replaced");
        Ok(count)
    }

    async fn refresh_names(&self) -> AppResult<usize> {
        let rows = self.source.name_rows().await?;
        let names: Vec<_> = rows.iter().filter_map(display_name_from_row).collect();
        let directory = NameDirectory::from_names(&names);
        let count = directory.len();
        self.store
            .replace_names(NameSnapshot {
                directory,
                fetched_at: Some(Utc::now()),
            })
            .await;
        tracing::debug!(count, "Name snapshot replaced");
        Ok(count)
    }

    async fn notify(&self, kind: SnapshotKind) {
        let payload = json!({ "type": "snapshot.updated", "kind": kind.as_str() });
        self.ws_manager
            .broadcast(Message::Text(payload.to_string().into()))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replacing_swaps_the_whole_snapshot() {
        let store = SnapshotStore::new();
        assert!(store.leads().await.fetched_at.is_none());

        let before = store.leads().await;
        store
            .replace_leads(LeadSnapshot {
                records: vec![LeadRecord::new(1), LeadRecord::new(2)],
                skipped: 1,
                fetched_at: Some(Utc::now()),
            })
            .await;

        // Readers holding the old Arc keep seeing the old data.
        assert!(before.records.is_empty());
        let after = store.leads().await;
        assert_eq!(after.records.len(), 2);
        assert_eq!(after.skipped, 1);
    }

    #[test]
    fn kind_names() {
        assert_eq!(SnapshotKind::Leads.as_str(), "leads");
        assert_eq!(
            serde_json::to_value(SnapshotKind::Names).unwrap(),
            serde_json::json!("names")
        );
    }
}
