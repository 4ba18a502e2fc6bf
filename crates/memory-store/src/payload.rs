//! Structured access into the event payload document.
//!
//! The payload column is opaque to the rest of the store; this module
//! is the one place that looks inside it. Lookups go through
//! `json_extract` on a dotted key path, and [`ensure_payload_index`]
//! materializes the matching expression index so a hot path never
//! degenerates into a row-by-row payload scan.

use serde_json::Value as JsonValue;
use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::{Event, EVENT_COLUMNS};
use crate::validation::validate_payload_key;

/// What a JSON value looks like to the engine's comparison. Booleans
/// surface from `json_extract` as 0/1 integers; objects and arrays as
/// minified JSON text.
enum Comparand<'a> {
    Null,
    Int(i64),
    Real(f64),
    Text(&'a str),
    Doc(String),
}

impl<'a> From<&'a JsonValue> for Comparand<'a> {
    fn from(value: &'a JsonValue) -> Self {
        match value {
            JsonValue::Null => Comparand::Null,
            JsonValue::Bool(flag) => Comparand::Int(i64::from(*flag)),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Comparand::Int(i),
                None => Comparand::Real(n.as_f64().unwrap_or_default()),
            },
            JsonValue::String(s) => Comparand::Text(s.as_str()),
            doc => Comparand::Doc(doc.to_string()),
        }
    }
}

/// Get events whose payload carries `value` at `key`, newest first.
///
/// `key` is a dotted path into the document (`"kind"`, `"meta.lang"`).
/// A `null` value matches payloads where the path is null or absent.
/// Document-valued matches compare minified JSON text.
pub async fn query_by_payload(
    pool: &SqlitePool,
    key: &str,
    value: &JsonValue,
    limit: Option<i64>,
) -> Result<Vec<Event>> {
    validate_payload_key(key)?;
    let extract = format!("json_extract(data, '$.{key}')");
    let limit = limit.unwrap_or(-1);

    let rows = match Comparand::from(value) {
        Comparand::Null => {
            let sql = payload_sql(&extract, "IS NULL");
            sqlx::query_as::<_, Event>(&sql)
                .bind(limit)
                .fetch_all(pool)
                .await?
        }
        Comparand::Int(i) => {
            let sql = payload_sql(&extract, "= ?");
            sqlx::query_as::<_, Event>(&sql)
                .bind(i)
                .bind(limit)
                .fetch_all(pool)
                .await?
        }
        Comparand::Real(r) => {
            let sql = payload_sql(&extract, "= ?");
            sqlx::query_as::<_, Event>(&sql)
                .bind(r)
                .bind(limit)
                .fetch_all(pool)
                .await?
        }
        Comparand::Text(s) => {
            let sql = payload_sql(&extract, "= ?");
            sqlx::query_as::<_, Event>(&sql)
                .bind(s)
                .bind(limit)
                .fetch_all(pool)
                .await?
        }
        Comparand::Doc(doc) => {
            let sql = payload_sql(&extract, "= json(?)");
            sqlx::query_as::<_, Event>(&sql)
                .bind(doc)
                .bind(limit)
                .fetch_all(pool)
                .await?
        }
    };

    Ok(rows)
}

/// Idempotently create the expression index serving a payload key path.
/// Deployments call this once per hot path; index maintenance from then
/// on is transactional with every append.
pub async fn ensure_payload_index(pool: &SqlitePool, key: &str) -> Result<()> {
    validate_payload_key(key)?;
    let index_name = format!("idx_events_data_{}", key.replace('.', "_"));
    let sql = format!(
        "CREATE INDEX IF NOT EXISTS {index_name} ON events (json_extract(data, '$.{key}'))"
    );

    sqlx::query(&sql).execute(pool).await?;
    tracing::info!("Ensured payload index: {}", index_name);

    Ok(())
}

fn payload_sql(extract: &str, predicate: &str) -> String {
    format!(
        "SELECT {EVENT_COLUMNS} FROM events WHERE {extract} {predicate} \
         ORDER BY timestamp DESC, id DESC LIMIT ?"
    )
}
