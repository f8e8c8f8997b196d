//! Staleness policy for cached holding prices.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

use crate::models::holding::{LAST_UPDATE_FORMAT, LAST_UPDATE_UNSET};

/// Parse a `Holding::last_update` stamp. Returns `None` for the unset
/// sentinel, empty strings, and anything that doesn't match the format.
pub fn parse_last_update(last_update: &str) -> Option<DateTime<Utc>> {
    let trimmed = last_update.trim();
    if trimmed.is_empty() || trimmed == LAST_UPDATE_UNSET {
        return None;
    }
    NaiveDateTime::parse_from_str(trimmed, LAST_UPDATE_FORMAT)
        .ok()
        .map(|dt| dt.and_utc())
}

/// Whether a cached price is too old to reuse.
///
/// Unset, empty, and malformed stamps all count as stale: when in doubt,
/// refetch rather than trust the cache.
pub fn is_outdated(last_update: &str, threshold: Duration, now: DateTime<Utc>) -> bool {
    match parse_last_update(last_update) {
        Some(updated_at) => now - updated_at > threshold,
        None => true,
    }
}
