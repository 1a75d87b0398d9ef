use chrono::{DateTime, Utc};

/// Current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// RFC 3339 text stored in `created_at` / `updated_at` columns
pub fn to_sqlite(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Parse a timestamp column written by `to_sqlite`
pub fn from_sqlite(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    s.parse::<DateTime<Utc>>()
}

/// Milliseconds since the epoch, used to stamp backup file names
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
