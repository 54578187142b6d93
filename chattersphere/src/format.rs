//! Human-readable timestamps for message lists.

use chattersphere_proto::message::Timestamp;

const MINUTE_MS: u64 = 60_000;
const HOUR_MS: u64 = 60 * MINUTE_MS;
const DAY_MS: u64 = 24 * HOUR_MS;

/// Describes `then` relative to `now`: "Just now", "5m ago", "3h ago",
/// "2d ago", or a `YYYY-MM-DD` date once a week has passed.
///
/// Future timestamps count as "Just now".
#[must_use]
pub fn format_relative(then: Timestamp, now: Timestamp) -> String {
    let elapsed = now.millis_since(then);
    if elapsed < MINUTE_MS {
        "Just now".to_string()
    } else if elapsed < HOUR_MS {
        format!("{}m ago", elapsed / MINUTE_MS)
    } else if elapsed < DAY_MS {
        format!("{}h ago", elapsed / HOUR_MS)
    } else if elapsed < 7 * DAY_MS {
        format!("{}d ago", elapsed / DAY_MS)
    } else {
        format_date(then)
    }
}

/// Formats `at` as a local wall-clock time using a chrono format string.
#[must_use]
pub fn format_clock(at: Timestamp, fmt: &str) -> String {
    i64::try_from(at.as_millis())
        .ok()
        .and_then(chrono::DateTime::from_timestamp_millis)
        .map(|dt| dt.with_timezone(&chrono::Local).format(fmt).to_string())
        .unwrap_or_default()
}

fn format_date(at: Timestamp) -> String {
    i64::try_from(at.as_millis())
        .ok()
        .and_then(chrono::DateTime::from_timestamp_millis)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}
