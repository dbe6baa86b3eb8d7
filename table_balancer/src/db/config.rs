//! Database configuration module.
//!
//! Provides configuration structures for database connection management.

use crate::seating::{SeatingError, SeatingResult};
use std::str::FromStr;

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub database_url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Connection timeout in seconds
    pub connection_timeout_secs: u64,

    /// Idle connection timeout in seconds
    pub idle_timeout_secs: u64,

    /// Maximum connection lifetime in seconds
    pub max_lifetime_secs: u64,
}

impl DatabaseConfig {
    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `DATABASE_URL`: PostgreSQL connection string
    /// - `DB_MAX_CONNECTIONS`: Maximum pool size (default: 10)
    /// - `DB_MIN_CONNECTIONS`: Minimum pool size (default: 1)
    /// - `DB_CONNECTION_TIMEOUT`: Connection timeout in seconds (default: 10)
    /// - `DB_IDLE_TIMEOUT`: Idle timeout in seconds (default: 600)
    /// - `DB_MAX_LIFETIME`: Max lifetime in seconds (default: 1800)
    ///
    /// # Errors
    ///
    /// * `SeatingError::InvalidConfiguration` - `DATABASE_URL` missing or a number unparsable
    pub fn from_env() -> SeatingResult<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_vars<F>(lookup: F) -> SeatingResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or_else(|| {
            SeatingError::InvalidConfiguration("DATABASE_URL must be set".to_string())
        })?;

        Ok(Self {
            database_url,
            max_connections: parse_var(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            min_connections: parse_var(&lookup, "DB_MIN_CONNECTIONS", 1)?,
            connection_timeout_secs: parse_var(&lookup, "DB_CONNECTION_TIMEOUT", 10)?,
            idle_timeout_secs: parse_var(&lookup, "DB_IDLE_TIMEOUT", 600)?,
            max_lifetime_secs: parse_var(&lookup, "DB_MAX_LIFETIME", 1800)?,
        })
    }

    /// Create a default configuration for development
    ///
    /// Uses `postgres://postgres@localhost/seating_db` as the database URL
    pub fn development() -> Self {
        Self {
            database_url: "postgres://postgres@localhost/seating_db".to_string(),
            max_connections: 10,
            min_connections: 1,
            connection_timeout_secs: 10,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::development()
    }
}

/// Parse an optional variable, falling back to `default` when unset
pub(crate) fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> SeatingResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            SeatingError::InvalidConfiguration(format!("{name} has invalid value '{raw}'"))
        }),
    }
}
