//! Repository for the lead/follow-up table (`chats` by default).

use serde_json::Value;
use sqlx::PgPool;

use crate::tables::TableName;

/// Reads the lead table. The service never writes to it.
pub struct LeadRepo;

impl LeadRepo {
    /// All rows, newest first.
    pub async fn list_rows(pool: &PgPool, table: &TableName) -> Result<Vec<Value>, sqlx::Error> {
        let query = format!(
            "SELECT to_jsonb(t) FROM {} t ORDER BY t.created_at DESC NULLS LAST",
            table.quoted()
        );
        sqlx::query_scalar::<_, Value>(&query).fetch_all(pool).await
    }
}
