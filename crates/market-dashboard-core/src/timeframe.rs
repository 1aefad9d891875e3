use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Granularity of indicator and price data. One is active for the whole dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeFrame {
    #[default]
    #[serde(rename = "1d")]
    Day1,
    #[serde(rename = "4h")]
    Hour4,
    #[serde(rename = "1h")]
    Hour1,
}

impl TimeFrame {
    /// Wire label used in backend query strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFrame::Day1 => "1d",
            TimeFrame::Hour4 => "4h",
            TimeFrame::Hour1 => "1h",
        }
    }

    pub fn all() -> &'static [TimeFrame] {
        &[TimeFrame::Day1, TimeFrame::Hour4, TimeFrame::Hour1]
    }

    /// Whether the analysis service currently computes indicators at this granularity.
    /// Informational only: panels still fetch and may find data for any time-frame.
    pub fn is_backend_supported(&self) -> bool {
        matches!(self, TimeFrame::Day1)
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeFrame {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1d" => Ok(TimeFrame::Day1),
            "4h" => Ok(TimeFrame::Hour4),
            "1h" => Ok(TimeFrame::Hour1),
            other => Err(CoreError::UnknownTimeFrame(other.to_string())),
        }
    }
}
