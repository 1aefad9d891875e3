use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::indicator::{IndicatorSnapshot, MA50, MA200, RSI14};

/// RSI level above which momentum counts as bullish.
const RSI_BULLISH: f64 = 55.0;

/// Directional verdict for a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Neutral,
}

impl Direction {
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Neutral => "neutral",
        }
    }

    /// Short badge text for panel headers.
    pub fn badge(&self) -> &'static str {
        match self {
            Direction::Up => "↑ up",
            Direction::Down => "↓ down",
            Direction::Neutral => "• neutral",
        }
    }

    /// Map a score onto a direction. `(0.4, 0.6)` exclusive is neutral.
    pub fn from_score(score: Decimal) -> Self {
        if score >= Decimal::new(6, 1) {
            Direction::Up
        } else if score <= Decimal::new(4, 1) {
            Direction::Down
        } else {
            Direction::Neutral
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Trend verdict plus the confidence score it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub direction: Direction,
    pub score: Decimal,
}

impl Classification {
    /// No evidence either way.
    pub const NONE: Classification = Classification {
        direction: Direction::Neutral,
        score: Decimal::ZERO,
    };
}

/// Classify the latest snapshot. An absent snapshot carries no evidence.
pub fn classify(snapshot: Option<&IndicatorSnapshot>) -> Classification {
    match snapshot {
        Some(snapshot) => classify_values(&snapshot.values),
        None => Classification::NONE,
    }
}

/// Score raw indicator values.
///
/// Trend (`ma50 > ma200`) adds 0.4 and momentum (`rsi14 > 55`) adds 0.3.
/// If any of the three inputs is missing the result is neutral with score 0.
pub fn classify_values(values: &BTreeMap<String, f64>) -> Classification {
    let (Some(ma50), Some(ma200), Some(rsi14)) =
        (values.get(MA50), values.get(MA200), values.get(RSI14))
    else {
        return Classification::NONE;
    };

    let mut score = Decimal::ZERO;
    if ma50 > ma200 {
        score += Decimal::new(4, 1);
    }
    if *rsi14 > RSI_BULLISH {
        score += Decimal::new(3, 1);
    }

    Classification {
        direction: Direction::from_score(score),
        score,
    }
}
