//! For interacting with the database.

use super::config::DatabaseConfig;
use sqlx::{
    pool::PoolOptions,
    sqlite::{SqliteConnectOptions, SqliteJournalMode},
    ConnectOptions, Sqlite, SqlitePool, Transaction,
};
use std::time::Duration;
use tracing::log::LevelFilter;

/// A common transaction type.
/// Use this for the business and persistence layer.
pub type Tx = Transaction<'static, Sqlite>;

/// A common database pool type.
pub type DbPool = SqlitePool;

/// Connects to the database based on some configuration.
pub fn init_db(config: &DatabaseConfig) -> DbPool {
    let db_options = SqliteConnectOptions::new()
        .filename(&config.filename)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .log_statements(LevelFilter::Debug);
    let db: DbPool = PoolOptions::default()
        .acquire_timeout(Duration::from_secs(5))
        .min_connections(1)
        .max_connections(config.max_connections)
        .connect_lazy_with(db_options);
    db
}

/// Brings the database schema up to date.
pub async fn run_migrations(db: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!().run(db).await?;
    tracing::info!("Database is connected");
    Ok(())
}
