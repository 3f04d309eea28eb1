//! Persistence for the citizen opt-in backend.
//!
//! Documents live in per-collection JSONB tables behind the
//! [`store::DocumentStore`] seam; reads go through the cache-aside
//! [`data_manager::DataManager`].

use sqlx::postgres::PgPoolOptions;

pub mod cache;
pub mod collections;
pub mod data_manager;
pub mod models;
pub mod store;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to verify connectivity.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
