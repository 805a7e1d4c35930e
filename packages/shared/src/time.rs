use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

/// Get current Unix timestamp (milliseconds, UTC)
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Render a Unix timestamp in milliseconds as an RFC 3339 string (UTC).
///
/// Out-of-range values fall back to the Unix epoch.
pub fn millis_to_rfc3339(millis: i64) -> String {
    to_datetime(millis).to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Render a Unix timestamp in milliseconds as `YYYY-MM-DD HH:MM:SS` (UTC).
pub fn millis_to_display(millis: i64) -> String {
    to_datetime(millis).format("%Y-%m-%d %H:%M:%S").to_string()
}

fn to_datetime(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}
