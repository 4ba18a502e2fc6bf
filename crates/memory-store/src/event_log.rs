//! Append-only event log.
//!
//! Events are written once and never updated or deleted. A successful
//! append is atomic (row and index entries together) and immediately
//! visible to every subsequent query.

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::types::Json;
use sqlx::SqlitePool;

use crate::clock;
use crate::error::{map_write_err, Result};
use crate::models::{Event, EVENT_COLUMNS};
use crate::validation::{
    validate_document, validate_event_type, validate_stream_id, MAX_DATA_BYTES,
    MAX_METADATA_BYTES,
};

/// Well-known classifier names written by the conversation pipeline.
/// The column itself is an open set; these are conveniences, not a
/// constraint.
pub mod event_types {
    pub const USER_MESSAGE: &str = "user_message";
    pub const BOT_RESPONSE: &str = "bot_response";
    pub const SYSTEM_EVENT: &str = "system_event";
}

/// Append an event, leaving the reserved columns at their defaults.
/// Returns the assigned id.
pub async fn append(
    pool: &SqlitePool,
    event_type: &str,
    user_id: i64,
    data: JsonValue,
) -> Result<i64> {
    append_full(
        pool,
        event_type,
        user_id,
        data,
        "",
        1,
        JsonValue::Object(serde_json::Map::new()),
    )
    .await
}

/// Append an event with the full column set, reserved fields included.
/// Returns the assigned id.
pub async fn append_full(
    pool: &SqlitePool,
    event_type: &str,
    user_id: i64,
    data: JsonValue,
    stream_id: &str,
    version: i64,
    metadata: JsonValue,
) -> Result<i64> {
    validate_event_type(event_type)?;
    validate_stream_id(stream_id)?;
    validate_document("data", &data, MAX_DATA_BYTES)?;
    validate_document("metadata", &metadata, MAX_METADATA_BYTES)?;

    let timestamp = clock::now();

    let result = sqlx::query(
        r#"
        INSERT INTO events (event_type, user_id, timestamp, data, stream_id, version, metadata)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(event_type)
    .bind(user_id)
    .bind(timestamp)
    .bind(Json(data))
    .bind(stream_id)
    .bind(version)
    .bind(Json(metadata))
    .execute(pool)
    .await
    .map_err(|e| map_write_err("event append", e))?;

    Ok(result.last_insert_rowid())
}

/// Get a user's events, newest first. `since` is exclusive; `None`
/// limit means all. Unknown users yield an empty list, not an error.
pub async fn query_by_user(
    pool: &SqlitePool,
    user_id: i64,
    since: Option<DateTime<Utc>>,
    limit: Option<i64>,
) -> Result<Vec<Event>> {
    let mut sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE user_id = ?");
    if since.is_some() {
        sql.push_str(" AND timestamp > ?");
    }
    sql.push_str(" ORDER BY timestamp DESC, id DESC LIMIT ?");

    let mut query = sqlx::query_as::<_, Event>(&sql).bind(user_id);
    if let Some(since) = since {
        query = query.bind(since);
    }
    let rows = query.bind(limit.unwrap_or(-1)).fetch_all(pool).await?;

    Ok(rows)
}

/// Get events of one classifier, newest first. Same semantics as
/// [`query_by_user`].
pub async fn query_by_type(
    pool: &SqlitePool,
    event_type: &str,
    since: Option<DateTime<Utc>>,
    limit: Option<i64>,
) -> Result<Vec<Event>> {
    let mut sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE event_type = ?");
    if since.is_some() {
        sql.push_str(" AND timestamp > ?");
    }
    sql.push_str(" ORDER BY timestamp DESC, id DESC LIMIT ?");

    let mut query = sqlx::query_as::<_, Event>(&sql).bind(event_type);
    if let Some(since) = since {
        query = query.bind(since);
    }
    let rows = query.bind(limit.unwrap_or(-1)).fetch_all(pool).await?;

    Ok(rows)
}

/// Count all recorded events.
pub async fn count_events(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM events
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}
