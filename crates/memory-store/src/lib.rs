//! SQLite persistence layer for conversational-agent memory.
//!
//! Two stores behind one schema: an append-only log of typed,
//! user-scoped events and a rolling short-term-memory (STM) buffer of
//! conversation turns. Both are keyed by user and ordered by time;
//! neither exposes an update or delete. The engine's own transactions
//! make every append atomic with its index maintenance, and identifier
//! allocation rides the engine's sequence, so concurrent writers need
//! no locking here.
//!
//! # Example
//!
//! ```no_run
//! use memory_store::{event_log, stm_buffer, Database};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and apply the schema (safe to repeat).
//!     let db = Database::connect("sqlite:memory.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Record an event and a conversation turn.
//!     event_log::append(db.pool(), "user_message", 1, json!({"text": "hi"})).await?;
//!     stm_buffer::append_turn(db.pool(), 1, "user", "hi", None, None, None).await?;
//!
//!     // Read the freshest context back.
//!     let turns = stm_buffer::recent(db.pool(), 1, 25).await?;
//!     println!("{} turns in window", turns.len());
//!
//!     Ok(())
//! }
//! ```

pub mod clock;
pub mod error;
pub mod event_log;
pub mod models;
pub mod payload;
pub mod stm_buffer;
pub mod validation;

pub use error::{Result, StoreError};
pub use models::{Event, Role, StmEntry, TurnStats};
pub use validation::ValidationError;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

/// Store connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size, sized for concurrent conversation handling
    /// with memory reads and writes in flight at once.
    const DEFAULT_POOL_SIZE: u32 = 20;

    /// Connect to a SQLite database.
    ///
    /// Use `?mode=rwc` in the URL to create the database file if it
    /// does not exist, or `sqlite::memory:` for an in-memory store.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!("Connected to memory store: {} (pool size: {})", url, pool_size);

        Ok(Self { pool })
    }

    /// Apply schema migrations.
    ///
    /// Creation is guarded by existence checks and applied versions are
    /// tracked, so calling this on every deployment is safe.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Applying memory schema...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Memory schema up to date");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
