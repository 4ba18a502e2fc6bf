//! Short-term conversational memory.
//!
//! A rolling per-user window of turns, append-only like the event log.
//! No retention bound is enforced here: "short-term" is nominal until a
//! later stage defines eviction.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::clock;
use crate::error::{map_write_err, Result};
use crate::models::{Role, StmEntry, TurnStats};
use crate::validation::{validate_content, validate_tag, MAX_EMOTION_LEN, MAX_MODE_LEN};

/// Append one conversational turn. `role` must be exactly "user" or
/// "assistant" and `content` must be non-blank; on validation failure
/// nothing is persisted. Returns the assigned id.
pub async fn append_turn(
    pool: &SqlitePool,
    user_id: i64,
    role: &str,
    content: &str,
    emotion: Option<&str>,
    mode: Option<&str>,
    importance_score: Option<i64>,
) -> Result<i64> {
    let role = Role::parse(role)?;
    validate_content(content)?;
    validate_tag("emotion", emotion, MAX_EMOTION_LEN)?;
    validate_tag("mode", mode, MAX_MODE_LEN)?;

    let created_at = clock::now();

    let result = sqlx::query(
        r#"
        INSERT INTO stm_buffer (user_id, role, content, emotion, mode, importance_score, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(role)
    .bind(content)
    .bind(emotion)
    .bind(mode)
    .bind(importance_score)
    .bind(created_at)
    .execute(pool)
    .await
    .map_err(|e| map_write_err("turn append", e))?;

    Ok(result.last_insert_rowid())
}

/// Get the `limit` most recent turns for a user, newest first. Fewer if
/// history is shorter, empty if there is none.
pub async fn recent(pool: &SqlitePool, user_id: i64, limit: i64) -> Result<Vec<StmEntry>> {
    let rows = sqlx::query_as::<_, StmEntry>(
        r#"
        SELECT id, user_id, role, content, emotion, mode, importance_score, created_at
        FROM stm_buffer
        WHERE user_id = ?
        ORDER BY created_at DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Get the most recent turns recorded at or before `cutoff`, newest
/// first. Supports reproducible historical reads.
pub async fn recent_as_of(
    pool: &SqlitePool,
    user_id: i64,
    cutoff: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<StmEntry>> {
    let rows = sqlx::query_as::<_, StmEntry>(
        r#"
        SELECT id, user_id, role, content, emotion, mode, importance_score, created_at
        FROM stm_buffer
        WHERE user_id = ? AND created_at <= ?
        ORDER BY created_at DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(cutoff)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Assemble a prompt context: the newest turns that fit the character
/// budget, returned in chronological order. The budget is applied
/// newest-backwards, so the most recent turns always survive.
pub async fn context(
    pool: &SqlitePool,
    user_id: i64,
    max_turns: i64,
    max_chars: usize,
) -> Result<Vec<StmEntry>> {
    let newest_first = recent(pool, user_id, max_turns).await?;

    let mut budget = max_chars;
    let mut kept = Vec::with_capacity(newest_first.len());
    for entry in newest_first {
        let chars = entry.content.chars().count();
        if chars > budget {
            break;
        }
        budget -= chars;
        kept.push(entry);
    }

    kept.reverse();
    Ok(kept)
}

/// Per-user turn statistics: counts per role plus the first and last
/// recorded instants.
pub async fn stats(pool: &SqlitePool, user_id: i64) -> Result<TurnStats> {
    let stats = sqlx::query_as::<_, TurnStats>(
        r#"
        SELECT
            COUNT(*) AS total_turns,
            COALESCE(SUM(role = 'user'), 0) AS user_turns,
            COALESCE(SUM(role = 'assistant'), 0) AS assistant_turns,
            MIN(created_at) AS first_at,
            MAX(created_at) AS last_at
        FROM stm_buffer
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::validation::ValidationError;
    use crate::Database;

    async fn test_db() -> Database {
        let db = Database::connect_with_pool_size("sqlite::memory:", 1)
            .await
            .unwrap();
        db.migrate().await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_single_turn_round_trip() {
        let db = test_db().await;
        let id = append_turn(db.pool(), 42, "user", "hi", None, None, None)
            .await
            .unwrap();

        let entries = recent(db.pool(), 42, 1).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, id);
        assert_eq!(entries[0].user_id, 42);
        assert_eq!(entries[0].role, Role::User);
        assert_eq!(entries[0].content, "hi");
        assert_eq!(entries[0].emotion, None);
        assert_eq!(entries[0].importance_score, None);
    }

    #[tokio::test]
    async fn test_recent_orders_newest_first_and_limits() {
        let db = test_db().await;
        for (role, content) in [
            ("user", "one"),
            ("assistant", "two"),
            ("user", "three"),
            ("assistant", "four"),
        ] {
            append_turn(db.pool(), 1, role, content, None, None, None)
                .await
                .unwrap();
        }

        let top_two = recent(db.pool(), 1, 2).await.unwrap();
        let contents: Vec<&str> = top_two.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, ["four", "three"]);

        // A shorter window is a prefix of a longer one.
        let top_four = recent(db.pool(), 1, 4).await.unwrap();
        assert_eq!(top_two[..], top_four[..2]);

        assert!(recent(db.pool(), 2, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_role_rejected_and_not_persisted() {
        let db = test_db().await;

        let err = append_turn(db.pool(), 1, "moderator", "hi", None, None, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::InvalidRole(_))
        ));

        let stats = stats(db.pool(), 1).await.unwrap();
        assert_eq!(stats.total_turns, 0);
    }

    #[tokio::test]
    async fn test_blank_content_rejected() {
        let db = test_db().await;

        for content in ["", "   ", "\n\t"] {
            let err = append_turn(db.pool(), 1, "user", content, None, None, None)
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                StoreError::Validation(ValidationError::Empty(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_reserved_fields_round_trip() {
        let db = test_db().await;
        append_turn(
            db.pool(),
            5,
            "assistant",
            "glad to help",
            Some("warm"),
            Some("companion"),
            Some(7),
        )
        .await
        .unwrap();

        let entries = recent(db.pool(), 5, 1).await.unwrap();
        assert_eq!(entries[0].emotion.as_deref(), Some("warm"));
        assert_eq!(entries[0].mode.as_deref(), Some("companion"));
        assert_eq!(entries[0].importance_score, Some(7));
    }

    #[tokio::test]
    async fn test_recent_as_of_excludes_later_turns() {
        let db = test_db().await;
        append_turn(db.pool(), 1, "user", "before", None, None, None)
            .await
            .unwrap();
        let cutoff = clock::now();
        append_turn(db.pool(), 1, "assistant", "after", None, None, None)
            .await
            .unwrap();

        let entries = recent_as_of(db.pool(), 1, cutoff, 10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].content, "before");

        let all = recent(db.pool(), 1, 10).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_context_is_chronological_and_budgeted() {
        let db = test_db().await;
        for content in ["aaaa", "bbbb", "cccc"] {
            append_turn(db.pool(), 1, "user", content, None, None, None)
                .await
                .unwrap();
        }

        let full = context(db.pool(), 1, 10, 1_000).await.unwrap();
        let contents: Vec<&str> = full.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, ["aaaa", "bbbb", "cccc"]);

        // An 8-char budget keeps the two newest turns, still in
        // chronological order.
        let trimmed = context(db.pool(), 1, 10, 8).await.unwrap();
        let contents: Vec<&str> = trimmed.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, ["bbbb", "cccc"]);
    }

    #[tokio::test]
    async fn test_stats_counts_per_role() {
        let db = test_db().await;
        append_turn(db.pool(), 9, "user", "hi", None, None, None)
            .await
            .unwrap();
        append_turn(db.pool(), 9, "assistant", "hello", None, None, None)
            .await
            .unwrap();
        append_turn(db.pool(), 9, "user", "bye", None, None, None)
            .await
            .unwrap();

        let stats = stats(db.pool(), 9).await.unwrap();
        assert_eq!(stats.total_turns, 3);
        assert_eq!(stats.user_turns, 2);
        assert_eq!(stats.assistant_turns, 1);
        let (first, last) = (stats.first_at.unwrap(), stats.last_at.unwrap());
        assert!(first <= last);
    }

    #[tokio::test]
    async fn test_stats_for_unknown_user_is_zeroed() {
        let db = test_db().await;

        let stats = stats(db.pool(), 404).await.unwrap();
        assert_eq!(stats.total_turns, 0);
        assert_eq!(stats.user_turns, 0);
        assert_eq!(stats.first_at, None);
        assert_eq!(stats.last_at, None);
    }
}
