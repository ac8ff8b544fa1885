//! Timeframe: the fixed interval of one candle.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeframeError {
    #[error("empty timeframe")]
    Empty,
    #[error("invalid timeframe '{0}': expected <count><unit> with unit one of s, m, h, d, w")]
    Invalid(String),
    #[error("timeframe must be longer than zero seconds")]
    Zero,
}

/// Candle interval, stored in seconds.
///
/// Parsed from and serialized as exchange-style strings: `"5m"`, `"1h"`, `"1d"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timeframe {
    secs: u64,
}

impl Timeframe {
    pub fn from_secs(secs: u64) -> Result<Self, TimeframeError> {
        if secs == 0 {
            return Err(TimeframeError::Zero);
        }
        Ok(Self { secs })
    }

    pub fn minutes(n: u64) -> Self {
        Self {
            secs: n.max(1) * 60,
        }
    }

    pub fn secs(&self) -> u64 {
        self.secs
    }

    pub fn duration(&self) -> Duration {
        Duration::seconds(self.secs as i64)
    }

    /// Whole candles elapsed between `from` and `to`. Zero when `to <= from`.
    pub fn bars_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
        let elapsed = (to - from).num_seconds();
        if elapsed <= 0 {
            return 0;
        }
        elapsed as u64 / self.secs
    }
}

impl Default for Timeframe {
    fn default() -> Self {
        Self::minutes(5)
    }
}

impl FromStr for Timeframe {
    type Err = TimeframeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TimeframeError::Empty);
        }
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| TimeframeError::Invalid(s.to_string()))?;
        let (count, unit) = s.split_at(split);
        let count: u64 = count
            .parse()
            .map_err(|_| TimeframeError::Invalid(s.to_string()))?;
        let unit_secs = match unit {
            "s" => 1,
            "m" => 60,
            "h" => 3_600,
            "d" => 86_400,
            "w" => 604_800,
            _ => return Err(TimeframeError::Invalid(s.to_string())),
        };
        let secs = count
            .checked_mul(unit_secs)
            .ok_or_else(|| TimeframeError::Invalid(s.to_string()))?;
        Self::from_secs(secs)
    }
}

impl TryFrom<String> for Timeframe {
    type Error = TimeframeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Timeframe> for String {
    fn from(tf: Timeframe) -> Self {
        tf.to_string()
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.secs;
        if s % 604_800 == 0 {
            write!(f, "{}w", s / 604_800)
        } else if s % 86_400 == 0 {
            write!(f, "{}d", s / 86_400)
        } else if s % 3_600 == 0 {
            write!(f, "{}h", s / 3_600)
        } else if s % 60 == 0 {
            write!(f, "{}m", s / 60)
        } else {
            write!(f, "{s}s")
        }
    }
}
