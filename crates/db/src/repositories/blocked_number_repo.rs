//! Repository for the blocked-number table (`numeros` by default).

use serde_json::Value;
use sqlx::PgPool;

use crate::tables::TableName;

/// Column the automation matches numbers against.
const NUMBER_COLUMN: &str = "numero";

pub struct BlockedNumberRepo;

impl BlockedNumberRepo {
    /// All rows, newest first.
    pub async fn list_rows(pool: &PgPool, table: &TableName) -> Result<Vec<Value>, sqlx::Error> {
        let query = format!(
            "SELECT to_jsonb(t) FROM {} t ORDER BY t.created_at DESC NULLS LAST",
            table.quoted()
        );
        sqlx::query_scalar::<_, Value>(&query).fetch_all(pool).await
    }

    pub async fn exists(pool: &PgPool, table: &TableName, number: &str) -> Result<bool, sqlx::Error> {
        let query = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE {NUMBER_COLUMN} = $1)",
            table.quoted()
        );
        sqlx::query_scalar::<_, bool>(&query)
            .bind(number)
            .fetch_one(pool)
            .await
    }

    /// Insert one number and return the stored row.
    pub async fn insert(pool: &PgPool, table: &TableName, number: &str) -> Result<Value, sqlx::Error> {
        let query = format!(
            "INSERT INTO {} AS t ({NUMBER_COLUMN}) VALUES ($1) RETURNING to_jsonb(t)",
            table.quoted()
        );
        sqlx::query_scalar::<_, Value>(&query)
            .bind(number)
            .fetch_one(pool)
            .await
    }

    /// Delete every row holding `number`. Returns the number of rows removed.
    pub async fn delete_by_number(
        pool: &PgPool,
        table: &TableName,
        number: &str,
    ) -> Result<u64, sqlx::Error> {
        let query = format!("DELETE FROM {} WHERE {NUMBER_COLUMN} = $1", table.quoted());
        let result = sqlx::query(&query).bind(number).execute(pool).await?;
        Ok(result.rows_affected())
    }
}
