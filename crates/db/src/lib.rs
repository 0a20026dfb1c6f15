//! Access to the hosted Postgres tables behind the dashboard.
//!
//! The tables are owned by the messaging automation, not by this service, so
//! there are no migrations here. Rows are read as `jsonb` and handed to
//! `leadboard_core::legacy` for mapping.

pub mod repositories;
pub mod tables;

use sqlx::postgres::PgPoolOptions;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Run a trivial query to verify the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await
        .map(|_| ())
}
