use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::candle::parse_timestamp;
use crate::symbol::Symbol;
use crate::timeframe::TimeFrame;

pub const MA50: &str = "ma50";
pub const MA200: &str = "ma200";
pub const RSI14: &str = "rsi14";
pub const VOL_SMA20: &str = "vol_sma20";

/// Indicators shown on a panel, in display order, with their labels.
pub const DISPLAYED: [(&str, &str); 4] = [
    (MA50, "MA50"),
    (MA200, "MA200"),
    (RSI14, "RSI(14)"),
    (VOL_SMA20, "Vol SMA20"),
];

/// Latest computed indicator values for one symbol and time-frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSnapshot {
    pub symbol: Symbol,
    #[serde(rename = "tf")]
    pub timeframe: TimeFrame,
    pub at: Option<DateTime<Utc>>,
    #[serde(rename = "data")]
    pub values: BTreeMap<String, f64>,
}

impl IndicatorSnapshot {
    /// Coerce an indicators payload into a snapshot.
    ///
    /// Returns `None` unless the payload is a JSON object. Non-numeric
    /// entries in `data` are dropped, an unreadable `at` becomes `None`, and
    /// `symbol`/`tf` fall back to the requested pair when missing or invalid.
    pub fn from_json(payload: &Value, symbol: &Symbol, timeframe: TimeFrame) -> Option<Self> {
        let object = payload.as_object()?;

        let symbol = object
            .get("symbol")
            .and_then(Value::as_str)
            .and_then(|s| Symbol::parse(s).ok())
            .unwrap_or_else(|| symbol.clone());
        let timeframe = object
            .get("tf")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
            .unwrap_or(timeframe);
        let at = object
            .get("at")
            .and_then(Value::as_str)
            .and_then(parse_timestamp);
        let values = object
            .get("data")
            .and_then(Value::as_object)
            .map(|data| {
                data.iter()
                    .filter_map(|(key, value)| {
                        value
                            .as_f64()
                            .filter(|v| v.is_finite())
                            .map(|v| (key.clone(), v))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            symbol,
            timeframe,
            at,
            values,
        })
    }

    pub fn value(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }
}
