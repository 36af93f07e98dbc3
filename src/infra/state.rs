//! Global application state.
//!
//! Used for access to common resources such as the
//! database pool and the application configuration.

use super::{config::Config, database::DbPool};
use axum::extract::FromRef;

/// Global application state.
#[derive(Clone, Debug, FromRef)]
pub struct AppState {
    db: DbPool,
    config: Config,
}

impl AppState {
    /// Constructs a new [`AppState`].
    pub fn new(db: DbPool, config: Config) -> Self {
        Self { db, config }
    }

    /// Returns the database pool.
    pub fn db(&self) -> &DbPool {
        &self.db
    }

    /// Returns the application configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}
