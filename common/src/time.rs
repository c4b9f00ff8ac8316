//! Time utilities for the quotation service.

use chrono::{DateTime, SubsecRound, Utc};

/// A timestamp with timezone (always UTC).
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
///
/// Truncated to microseconds, the resolution of PostgreSQL `TIMESTAMPTZ`,
/// so that a value survives a store round trip unchanged.
pub fn now() -> Timestamp {
    Utc::now().trunc_subsecs(6)
}

/// Milliseconds since the Unix epoch, as exposed by the HTTP API.
pub fn unix_millis(timestamp: Timestamp) -> i64 {
    timestamp.timestamp_millis()
}
