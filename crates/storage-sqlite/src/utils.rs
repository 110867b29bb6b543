//! Utility functions for SQLite storage operations.

use chrono::{DateTime, SecondsFormat, Utc};

/// Maximum number of parameters for SQLite IN (...) queries.
///
/// SQLite caps the parameters per statement (SQLITE_MAX_VARIABLE_NUMBER,
/// typically 999). 500 leaves room for the other parameters in the query.
pub const SQLITE_MAX_PARAMS_CHUNK: usize = 500;

/// Chunk a slice into smaller slices for batch SQLite queries.
pub fn chunk_for_sqlite<T>(items: &[T]) -> impl Iterator<Item = &[T]> {
    items.chunks(SQLITE_MAX_PARAMS_CHUNK)
}

/// Timestamps are stored as fixed-width RFC 3339 text so they sort lexically.
pub fn to_db_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Unparseable values fall back to now rather than failing the whole read.
pub fn from_db_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
