//! Repository for the chat-history table written by the automation.
//!
//! Rows carry `id`, `session_id` (the remote id) and a `message` payload.

use serde_json::Value;
use sqlx::PgPool;

use crate::tables::TableName;

pub struct ChatHistoryRepo;

impl ChatHistoryRepo {
    /// One conversation in insertion order.
    pub async fn list_for_session(
        pool: &PgPool,
        table: &TableName,
        session_id: &str,
    ) -> Result<Vec<Value>, sqlx::Error> {
        let query = format!(
            "SELECT to_jsonb(t) FROM {} t WHERE t.session_id = $1 ORDER BY t.id ASC",
            table.quoted()
        );
        sqlx::query_scalar::<_, Value>(&query)
            .bind(session_id)
            .fetch_all(pool)
            .await
    }

    /// Every message of every conversation, in insertion order.
    pub async fn list_all(pool: &PgPool, table: &TableName) -> Result<Vec<Value>, sqlx::Error> {
        let query = format!("SELECT to_jsonb(t) FROM {} t ORDER BY t.id ASC", table.quoted());
        sqlx::query_scalar::<_, Value>(&query).fetch_all(pool).await
    }
}
