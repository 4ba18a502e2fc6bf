//! Field validation for store writes.
//!
//! Every write path validates before touching storage, so a failed
//! append is guaranteed to have persisted nothing.

use std::fmt;

use serde_json::Value as JsonValue;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Empty value where one is required.
    Empty(String),
    /// Value too long.
    TooLong {
        field: String,
        max: usize,
        actual: usize,
    },
    /// Role outside the closed {user, assistant} set.
    InvalidRole(String),
    /// Serialized document exceeds its size budget.
    DocumentTooLarge {
        field: String,
        max: usize,
        actual: usize,
    },
    /// Payload key path contains characters that cannot be inlined into
    /// an index or extract expression.
    InvalidKeyPath(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Empty(field) => write!(f, "{} cannot be empty", field),
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
            ValidationError::InvalidRole(role) => {
                write!(f, "role must be \"user\" or \"assistant\", got {:?}", role)
            }
            ValidationError::DocumentTooLarge { field, max, actual } => {
                write!(f, "{} is too large ({} bytes, max {})", field, actual, max)
            }
            ValidationError::InvalidKeyPath(key) => {
                write!(f, "invalid payload key path {:?}", key)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Maximum length for the event classifier.
pub const MAX_EVENT_TYPE_LEN: usize = 50;

/// Maximum length for the reserved stream identifier.
pub const MAX_STREAM_ID_LEN: usize = 255;

/// Maximum length for the reserved emotion tag.
pub const MAX_EMOTION_LEN: usize = 50;

/// Maximum length for the reserved mode tag.
pub const MAX_MODE_LEN: usize = 20;

/// Maximum serialized size of an event payload document.
pub const MAX_DATA_BYTES: usize = 64_000;

/// Maximum serialized size of the reserved metadata document.
pub const MAX_METADATA_BYTES: usize = 1_024;

/// Validate an event classifier: required, at most 50 characters.
pub fn validate_event_type(event_type: &str) -> Result<(), ValidationError> {
    if event_type.trim().is_empty() {
        return Err(ValidationError::Empty("event_type".to_string()));
    }

    let actual = event_type.chars().count();
    if actual > MAX_EVENT_TYPE_LEN {
        return Err(ValidationError::TooLong {
            field: "event_type".to_string(),
            max: MAX_EVENT_TYPE_LEN,
            actual,
        });
    }

    Ok(())
}

/// Validate the reserved stream identifier. Empty is the default and is
/// allowed; only the length bound is enforced.
pub fn validate_stream_id(stream_id: &str) -> Result<(), ValidationError> {
    let actual = stream_id.chars().count();
    if actual > MAX_STREAM_ID_LEN {
        return Err(ValidationError::TooLong {
            field: "stream_id".to_string(),
            max: MAX_STREAM_ID_LEN,
            actual,
        });
    }

    Ok(())
}

/// Validate turn content: required, non-blank, otherwise unbounded.
pub fn validate_content(content: &str) -> Result<(), ValidationError> {
    if content.trim().is_empty() {
        return Err(ValidationError::Empty("content".to_string()));
    }

    Ok(())
}

/// Validate an optional reserved tag against its length bound.
pub fn validate_tag(
    field: &str,
    value: Option<&str>,
    max: usize,
) -> Result<(), ValidationError> {
    if let Some(value) = value {
        let actual = value.chars().count();
        if actual > max {
            return Err(ValidationError::TooLong {
                field: field.to_string(),
                max,
                actual,
            });
        }
    }

    Ok(())
}

/// Validate a JSON document against its serialized size budget.
pub fn validate_document(
    field: &str,
    document: &JsonValue,
    max: usize,
) -> Result<(), ValidationError> {
    let actual = document.to_string().len();
    if actual > max {
        return Err(ValidationError::DocumentTooLarge {
            field: field.to_string(),
            max,
            actual,
        });
    }

    Ok(())
}

/// Validate a payload key path. Paths are inlined into extract and index
/// expressions (they cannot be bound parameters), so only dotted
/// identifier segments are accepted.
pub fn validate_payload_key(key: &str) -> Result<(), ValidationError> {
    if key.is_empty() {
        return Err(ValidationError::Empty("payload key".to_string()));
    }

    let well_formed = !key.starts_with('.')
        && !key.ends_with('.')
        && !key.contains("..")
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');

    if !well_formed {
        return Err(ValidationError::InvalidKeyPath(key.to_string()));
    }

    Ok(())
}
