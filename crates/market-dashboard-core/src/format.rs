use chrono::{DateTime, Utc};

/// Placeholder shown for values that are not available.
pub const PLACEHOLDER: &str = "-";

pub fn fmt_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}"),
        None => PLACEHOLDER.to_string(),
    }
}

pub fn fmt_timestamp(at: Option<DateTime<Utc>>) -> String {
    match at {
        Some(ts) => ts.format("%Y-%m-%d %H:%M UTC").to_string(),
        None => PLACEHOLDER.to_string(),
    }
}
