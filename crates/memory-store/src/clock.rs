//! Identifier and clock provisioning.
//!
//! Identifiers are delegated to the storage engine's auto-increment
//! sequence: allocation is atomic under unbounded concurrent writers,
//! values are strictly increasing and never reused, and `append`
//! surfaces the allocated value via `last_insert_rowid`. Only the clock
//! half lives in-process.

use chrono::{DateTime, Utc};

/// Current wall-clock time as a timezone-aware instant.
///
/// Monotonicity across calls is not guaranteed (the wall clock may be
/// adjusted); timestamps are advisory ordering keys, and the record id
/// is the tiebreak for equal instants.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}
