//! Repository for the display-name table.

use serde_json::Value;
use sqlx::PgPool;

use crate::tables::TableName;

pub struct NameRepo;

impl NameRepo {
    /// All rows in storage order.
    pub async fn list_rows(pool: &PgPool, table: &TableName) -> Result<Vec<Value>, sqlx::Error> {
        let query = format!("SELECT to_jsonb(t) FROM {} t", table.quoted());
        sqlx::query_scalar::<_, Value>(&query).fetch_all(pool).await
    }
}
