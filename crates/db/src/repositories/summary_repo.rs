//! Repository for the process-summary table (`sumario` by default).

use serde_json::Value;
use sqlx::PgPool;

use crate::tables::TableName;

pub struct SummaryRepo;

impl SummaryRepo {
    /// All rows, most recent `Date` first.
    pub async fn list_rows(pool: &PgPool, table: &TableName) -> Result<Vec<Value>, sqlx::Error> {
        let query = format!(
            "SELECT to_jsonb(t) FROM {} t ORDER BY t.\"Date\" DESC NULLS LAST",
            table.quoted()
        );
        sqlx::query_scalar::<_, Value>(&query).fetch_all(pool).await
    }
}
