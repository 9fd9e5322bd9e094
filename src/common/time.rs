//! Time-related utilities.
//!
//! Timestamps are informational only (session/room creation times shown in
//! the debug snapshot); nothing in the pairing logic depends on them.

use chrono::{DateTime, FixedOffset, TimeZone, Utc};

fn jst_offset() -> FixedOffset {
    // JST is UTC+9, which is always a valid offset
    FixedOffset::east_opt(9 * 3600).unwrap()
}

/// Get current Unix timestamp in JST (milliseconds)
pub fn get_jst_timestamp() -> i64 {
    let now_jst: DateTime<FixedOffset> = Utc::now().with_timezone(&jst_offset());
    now_jst.timestamp_millis()
}

/// Convert Unix timestamp (milliseconds) to JST RFC 3339 format
pub fn timestamp_to_jst_rfc3339(timestamp_millis: i64) -> String {
    let seconds = timestamp_millis / 1000;
    let nanos = ((timestamp_millis % 1000) * 1_000_000) as u32;
    match jst_offset().timestamp_opt(seconds, nanos) {
        chrono::LocalResult::Single(dt) => dt.to_rfc3339(),
        _ => String::from("invalid timestamp"),
    }
}
