use chrono::{DateTime, FixedOffset, Utc};

// Queensland does not observe daylight saving.
const BRISBANE_OFFSET_SECS: i32 = 10 * 3600;
const BRISBANE_ABBR: &str = "AEST";

fn to_brisbane(value: DateTime<Utc>) -> Option<DateTime<FixedOffset>> {
    FixedOffset::east_opt(BRISBANE_OFFSET_SECS).map(|tz| value.with_timezone(&tz))
}

/// `DD-MM-YYYY HH:MM AEST`, empty for missing values.
pub fn brisbane(value: Option<DateTime<Utc>>) -> String {
    value
        .and_then(to_brisbane)
        .map(|t| format!("{} {BRISBANE_ABBR}", t.format("%d-%m-%Y %H:%M")))
        .unwrap_or_default()
}

/// Same as [`brisbane`] with seconds.
pub fn brisbane_full(value: Option<DateTime<Utc>>) -> String {
    value
        .and_then(to_brisbane)
        .map(|t| format!("{} {BRISBANE_ABBR}", t.format("%d-%m-%Y %H:%M:%S")))
        .unwrap_or_default()
}
