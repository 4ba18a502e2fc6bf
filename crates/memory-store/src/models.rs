//! Store models.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;

use crate::validation::ValidationError;

/// Column list shared by every event query.
pub(crate) const EVENT_COLUMNS: &str =
    "id, event_type, user_id, timestamp, data, stream_id, version, metadata";

/// An immutable record of something that happened in the system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Event {
    /// Auto-incrementing ID, strictly increasing, never reused.
    pub id: i64,
    /// Short classifier (e.g. "user_message"); an open set.
    pub event_type: String,
    /// Owning user. No foreign key is declared on purpose.
    pub user_id: i64,
    /// Time of occurrence, UTC.
    pub timestamp: DateTime<Utc>,
    /// Opaque structured payload.
    #[sqlx(json)]
    pub data: JsonValue,
    /// Reserved stream grouping key. Currently inert.
    pub stream_id: String,
    /// Reserved versioning field. Currently inert.
    pub version: i64,
    /// Reserved free-form document. Currently inert.
    #[sqlx(json)]
    pub metadata: JsonValue,
}

/// Speaker of a conversational turn. The one closed set in the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// The stored representation of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Parse a role from caller input. Anything outside the closed set
    /// is a validation error, not a storage error.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(ValidationError::InvalidRole(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single turn of short-term conversational memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct StmEntry {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Owning user.
    pub user_id: i64,
    /// Who spoke.
    pub role: Role,
    /// Turn text.
    pub content: String,
    /// Reserved emotion tag. Currently inert.
    pub emotion: Option<String>,
    /// Reserved mode tag. Currently inert.
    pub mode: Option<String>,
    /// Reserved long-term-memory score. Currently inert.
    pub importance_score: Option<i64>,
    /// Insertion timestamp, UTC.
    pub created_at: DateTime<Utc>,
}

/// Per-user turn statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TurnStats {
    /// Total turns recorded for the user.
    pub total_turns: i64,
    /// Turns spoken by the user.
    pub user_turns: i64,
    /// Turns spoken by the assistant.
    pub assistant_turns: i64,
    /// Oldest recorded turn, if any.
    pub first_at: Option<DateTime<Utc>>,
    /// Newest recorded turn, if any.
    pub last_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("user").unwrap(), Role::User);
        assert_eq!(Role::parse("assistant").unwrap(), Role::Assistant);

        for bad in ["moderator", "User", "ASSISTANT", "", " user"] {
            assert!(
                matches!(Role::parse(bad), Err(ValidationError::InvalidRole(_))),
                "expected {:?} to be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_role_display_matches_stored_form() {
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Assistant.as_str(), "assistant");
    }
}
