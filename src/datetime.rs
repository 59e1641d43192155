//! Date/time utilities for rendering post timestamps.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Format used by the board and thread views.
pub const POST_TIME_FORMAT: &str = "%H:%M:%S %d %b %Y";

/// Current time as unix seconds, used to stamp new posts.
pub fn now_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// Format a unix timestamp in the given timezone.
///
/// Unknown timezone names fall back to UTC. Timestamps outside chrono's
/// range are rendered as the raw number.
pub fn format_timestamp(timestamp: i64, timezone: &str, format: &str) -> String {
    let Some(dt) = DateTime::<Utc>::from_timestamp(timestamp, 0) else {
        return timestamp.to_string();
    };
    match timezone.parse::<Tz>() {
        Ok(tz) => dt.with_timezone(&tz).format(format).to_string(),
        Err(_) => dt.format(format).to_string(),
    }
}

/// Format a post timestamp with [`POST_TIME_FORMAT`].
pub fn format_post_time(timestamp: i64, timezone: &str) -> String {
    format_timestamp(timestamp, timezone, POST_TIME_FORMAT)
}
