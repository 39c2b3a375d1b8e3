pub mod db;

pub mod items;
pub mod orders;
pub mod users;

use std::{env, str::FromStr, time::Duration};

use log::info;
use sqlx::{
    migrate::{MigrateError, Migrator},
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

const SQLITE_DB_URL: &str = "sqlite://data/spawn_market.db";
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

pub static MIGRATOR: Migrator = sqlx::migrate!("./src/db/sqlite/migrations");

pub fn db_url() -> String {
    let result = env::var("SPAWN_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ SPAWN_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

/// Creates a new connection pool. The database file is created if it does not exist yet.
///
/// Writers wait on each other for up to [`BUSY_TIMEOUT`] rather than failing immediately with `SQLITE_BUSY`.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await?;
    info!("🗃️ Database migrations are up to date");
    Ok(())
}
