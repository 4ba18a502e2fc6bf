//! Schema setup and verification for the agent memory store.
//!
//! Connects, applies migrations, then verifies the result: both tables,
//! every expected index, and readable row counts. Exits non-zero if
//! anything is missing.

mod config;

use clap::Parser;
use memory_store::Database;
use tracing::{error, info};

use crate::config::Config;

const TABLES: [&str; 2] = ["events", "stm_buffer"];
const INDEXES: [&str; 3] = [
    "idx_events_user_time",
    "idx_events_type_time",
    "idx_stm_user_time",
];

#[derive(Debug, Parser)]
#[command(name = "memory-setup")]
#[command(about = "Apply and verify the agent memory schema")]
struct Args {
    /// Database URL. Falls back to DATABASE_URL env.
    #[arg(long)]
    database_url: Option<String>,

    /// Connection pool size. Falls back to MEMORY_POOL_SIZE env.
    #[arg(long)]
    pool_size: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let mut config = Config::from_env();
    if let Some(url) = args.database_url {
        config.database_url = url;
    }
    if let Some(size) = args.pool_size {
        config.pool_size = size;
    }

    info!(url = %config.database_url, "Applying memory schema");
    let db = Database::connect_with_pool_size(&config.database_url, config.pool_size).await?;
    db.migrate().await?;

    verify(&db).await?;

    db.close().await;
    info!("Memory store ready");
    Ok(())
}

/// Check the applied schema against what the store expects to find.
async fn verify(db: &Database) -> Result<(), Box<dyn std::error::Error>> {
    for table in TABLES {
        let present = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(table)
        .fetch_one(db.pool())
        .await?;

        if present == 0 {
            error!(table, "Expected table is missing");
            return Err(format!("table {table} missing after migration").into());
        }

        let rows = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(db.pool())
            .await?;
        info!(table, rows, "Table verified");
    }

    for index in INDEXES {
        let present = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = ?",
        )
        .bind(index)
        .fetch_one(db.pool())
        .await?;

        if present == 0 {
            error!(index, "Expected index is missing");
            return Err(format!("index {index} missing after migration").into());
        }
    }
    info!("All indexes present");

    Ok(())
}
