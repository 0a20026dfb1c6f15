//! Where the dashboard's rows come from.
//!
//! [`DashboardSource`] is the seam between handlers/snapshots and the hosted
//! tables. Production uses [`PgDashboardSource`]; tests plug in an in-memory
//! implementation. Rows are untyped JSON and get mapped by
//! `leadboard_core::legacy` and friends.

use async_trait::async_trait;
use leadboard_db::repositories::{
    AnalysisRepo, BlockedNumberRepo, ChatHistoryRepo, LeadRepo, NameRepo, SummaryRepo,
};
use leadboard_db::tables::TableNames;
use leadboard_db::DbPool;
use serde_json::Value;

#[async_trait]
pub trait DashboardSource: Send + Sync {
    /// Every row of the lead table, newest first.
    async fn lead_rows(&self) -> Result<Vec<Value>, sqlx::Error>;

    /// Every row of the display-name table.
    async fn name_rows(&self) -> Result<Vec<Value>, sqlx::Error>;

    /// Message rows of one conversation.
    async fn history_rows(&self, session_id: &str) -> Result<Vec<Value>, sqlx::Error>;

    /// Message rows of every conversation.
    async fn all_history_rows(&self) -> Result<Vec<Value>, sqlx::Error>;

    async fn blocked_rows(&self) -> Result<Vec<Value>, sqlx::Error>;

    async fn blocked_exists(&self, number: &str) -> Result<bool, sqlx::Error>;

    async fn insert_blocked(&self, number: &str) -> Result<Value, sqlx::Error>;

    /// Returns how many rows were removed.
    async fn delete_blocked(&self, number: &str) -> Result<u64, sqlx::Error>;

    async fn summary_rows(&self) -> Result<Vec<Value>, sqlx::Error>;

    async fn latest_analysis(&self) -> Result<Option<Value>, sqlx::Error>;

    async fn store_analysis(&self, row: &Value) -> Result<Value, sqlx::Error>;
}

/// Reads the configured tables through the repositories.
pub struct PgDashboardSource {
    pool: DbPool,
    tables: TableNames,
}

impl PgDashboardSource {
    pub fn new(pool: DbPool, tables: TableNames) -> Self {
        Self { pool, tables }
    }
}

#[async_trait]
impl DashboardSource for PgDashboardSource {
    async fn lead_rows(&self) -> Result<Vec<Value>, sqlx::Error> {
        LeadRepo::list_rows(&self.pool, &self.tables.leads).await
    }

    async fn name_rows(&self) -> Result<Vec<Value>, sqlx::Error> {
        NameRepo::list_rows(&self.pool, &self.tables.names).await
    }

    async fn history_rows(&self, session_id: &str) -> Result<Vec<Value>, sqlx::Error> {
        ChatHistoryRepo::list_for_session(&self.pool, &self.tables.messages, session_id).await
    }

    async fn all_history_rows(&self) -> Result<Vec<Value>, sqlx::Error> {
        ChatHistoryRepo::list_all(&self.pool, &self.tables.messages).await
    }

    async fn blocked_rows(&self) -> Result<Vec<Value>, sqlx::Error> {
        BlockedNumberRepo::list_rows(&self.pool, &self.tables.blocked).await
    }

    async fn blocked_exists(&self, number: &str) -> Result<bool, sqlx::Error> {
        BlockedNumberRepo::exists(&self.pool, &self.tables.blocked, number).await
    }

    async fn insert_blocked(&self, number: &str) -> Result<Value, sqlx::Error> {
        BlockedNumberRepo::insert(&self.pool, &self.tables.blocked, number).await
    }

    async fn delete_blocked(&self, number: &str) -> Result<u64, sqlx::Error> {
        BlockedNumberRepo::delete_by_number(&self.pool, &self.tables.blocked, number).await
    }

    async fn summary_rows(&self) -> Result<Vec<Value>, sqlx::Error> {
        SummaryRepo::list_rows(&self.pool, &self.tables.summaries).await
    }

    async fn latest_analysis(&self) -> Result<Option<Value>, sqlx::Error> {
        AnalysisRepo::latest(&self.pool, &self.tables.analysis).await
    }

    async fn store_analysis(&self, row: &Value) -> Result<Value, sqlx::Error> {
        AnalysisRepo::upsert(&self.pool, &self.tables.analysis, row).await
    }
}
