//! For reading application configuration.

use serde::Deserialize;
use std::time::Duration;

/// Application configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct ServerConfig {
    /// Server address.
    pub http_address: String,
    /// Server http port.
    pub http_port: u16,
    /// Message server address.
    pub rpc_address: String,
    /// Message server port.
    pub rpc_port: u16,
    /// How long a request may run before being aborted.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

/// Database configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the database file.
    pub filename: String,
    /// The maximum number of pooled connections.
    pub max_connections: u32,
}

/// Retrieve [`Config`] from the default configuration file.
#[tracing::instrument]
pub fn load_config() -> Result<Config, config::ConfigError> {
    config::Config::builder()
        .add_source(config::File::with_name("config"))
        .add_source(config::Environment::with_prefix("app").separator("__"))
        .build()?
        .try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::load_config;

    #[test]
    fn config_file_parses() {
        let config = load_config().unwrap();
        assert!(config.server.http_port != 0);
        assert!(config.database.max_connections > 0);
    }
}
