//! Configuration loaded from environment variables.

use std::env;

/// Setup tool configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database URL.
    pub database_url: String,
    /// Connection pool size.
    pub pool_size: u32,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `DATABASE_URL` | SQLite database URL | `sqlite:memory.db?mode=rwc` |
    /// | `MEMORY_POOL_SIZE` | Connection pool size | `20` |
    pub fn from_env() -> Self {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:memory.db?mode=rwc".to_string());

        let pool_size = env::var("MEMORY_POOL_SIZE")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(20);

        Self {
            database_url,
            pool_size,
        }
    }
}
