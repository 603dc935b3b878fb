//! Configuration management for the server.

use std::env;
use std::time::Duration;

/// Default bound on row-lock waits inside a unit of work.
const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5000;

/// Default database pool size.
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// PostgreSQL connection URL
    pub database_url: String,
    /// Maximum pooled database connections
    pub max_connections: u32,
    /// Shared password for the auth gate; `None` leaves the API open
    pub auth_secret: Option<String>,
    /// How long a unit of work may wait for a row lock
    pub lock_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;

        let database_url = env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)?;

        let max_connections = match env::var("DB_MAX_CONNECTIONS") {
            Ok(raw) => parse_positive(&raw).ok_or(ConfigError::InvalidMaxConnections)? as u32,
            Err(_) => DEFAULT_MAX_CONNECTIONS,
        };

        let lock_timeout_ms = match env::var("LOCK_TIMEOUT_MS") {
            Ok(raw) => parse_positive(&raw).ok_or(ConfigError::InvalidLockTimeout)?,
            Err(_) => DEFAULT_LOCK_TIMEOUT_MS,
        };

        let auth_secret = env::var("AUTH_SECRET").ok().filter(|s| !s.is_empty());

        Ok(Self {
            host,
            port,
            database_url,
            max_connections,
            auth_secret,
            lock_timeout: Duration::from_millis(lock_timeout_ms),
        })
    }
}

fn parse_positive(raw: &str) -> Option<u64> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|v| *v > 0 && *v <= u32::MAX as u64)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("DATABASE_URL environment variable is required")]
    MissingDatabaseUrl,

    #[error("Invalid PORT value")]
    InvalidPort,

    #[error("Invalid LOCK_TIMEOUT_MS value, expected a positive number of milliseconds")]
    InvalidLockTimeout,

    #[error("Invalid DB_MAX_CONNECTIONS value, expected a positive integer")]
    InvalidMaxConnections,
}
