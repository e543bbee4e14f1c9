use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

pub mod conference_repo;
pub mod dashboard_repo;
pub mod delegate_repo;
pub mod registration_repo;
pub mod schema;
pub mod seed;

/// Opens a private in-memory store with the schema applied.
///
/// The pool holds exactly one connection that never expires: every
/// connection to `sqlite::memory:` is its own database, so a second or
/// recycled connection would see empty tables.
pub async fn open_in_memory() -> sqlx::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    schema::create_schema(&pool).await?;
    Ok(pool)
}

/// In-memory store seeded with the sample conferences, delegates and registrations.
pub async fn open_seeded() -> sqlx::Result<SqlitePool> {
    let pool = open_in_memory().await?;
    seed::seed_sample_data(&pool).await?;
    Ok(pool)
}
