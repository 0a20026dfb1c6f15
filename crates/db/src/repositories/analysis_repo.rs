//! Repository for the cached conversation-analysis table.

use serde_json::Value;
use sqlx::PgPool;

use crate::tables::TableName;

/// Columns written when the global analysis is stored.
const WRITE_COLUMNS: &[&str] = &[
    "\"remotejID\"",
    "avg_response_time_hours",
    "conversion_rate",
    "avg_messages_per_lead",
    "peak_activity_hours",
    "top_keywords",
    "sentiment_analysis",
    "followup_effectiveness",
    "total_conversations",
];

pub struct AnalysisRepo;

impl AnalysisRepo {
    /// The most recently updated analysis row, if any.
    pub async fn latest(pool: &PgPool, table: &TableName) -> Result<Option<Value>, sqlx::Error> {
        let query = format!(
            "SELECT to_jsonb(t) FROM {} t ORDER BY t.updated_at DESC NULLS LAST LIMIT 1",
            table.quoted()
        );
        sqlx::query_scalar::<_, Value>(&query)
            .fetch_optional(pool)
            .await
    }

    /// Upsert one analysis row keyed by `remotejID`.
    ///
    /// `row` is a JSON object whose keys match the table's columns; Postgres
    /// converts each value to the column type via `jsonb_populate_record`.
    pub async fn upsert(pool: &PgPool, table: &TableName, row: &Value) -> Result<Value, sqlx::Error> {
        let quoted = table.quoted();
        let columns = WRITE_COLUMNS.join(", ");
        let selected = WRITE_COLUMNS
            .iter()
            .map(|c| format!("r.{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        let updates = WRITE_COLUMNS
            .iter()
            .skip(1)
            .map(|c| format!("{c} = EXCLUDED.{c}"))
            .collect::<Vec<_>>()
            .join(", ");

        let query = format!(
            "INSERT INTO {quoted} AS t ({columns}, updated_at) \
             SELECT {selected}, NOW() FROM jsonb_populate_record(NULL::{quoted}, $1) r \
             ON CONFLICT (\"remotejID\") DO UPDATE SET {updates}, updated_at = NOW() \
             RETURNING to_jsonb(t)"
        );
        sqlx::query_scalar::<_, Value>(&query)
            .bind(row)
            .fetch_one(pool)
            .await
    }
}
