use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A single OHLCV candle as served by the gateway's prices endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candle {
    #[serde(rename = "ts", deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// Parse a backend timestamp. The gateway emits `isoformat()` strings, which
/// carry an offset for `timestamptz` columns and none for naive ones.
/// Naive values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
}

/// Coerce a prices payload into an ordered price history.
///
/// Anything other than a JSON array yields an empty history. Elements that do
/// not decode as a candle are skipped; the rest keep the order they arrived in.
pub fn decode_price_history(payload: &Value) -> Vec<Candle> {
    match payload {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| Candle::deserialize(item).ok())
            .collect(),
        _ => Vec::new(),
    }
}

/// Closing prices in chronological order, as plain floats for plotting.
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().filter_map(|c| c.close.to_f64()).collect()
}
