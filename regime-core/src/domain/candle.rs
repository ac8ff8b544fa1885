//! Candle and CandleSeries: the market data the engine consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Timeframe;

/// One fixed-interval OHLCV bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Typical price: (high + low + close) / 3.
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("candle at {got} is not after the previous candle at {last}")]
    NonIncreasingTime {
        last: DateTime<Utc>,
        got: DateTime<Utc>,
    },
}

/// Append-only, strictly time-ordered candles for one pair at one timeframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandleSeries {
    pair: String,
    timeframe: Timeframe,
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new(pair: impl Into<String>, timeframe: Timeframe) -> Self {
        Self {
            pair: pair.into(),
            timeframe,
            candles: Vec::new(),
        }
    }

    /// Build a series from candles, rejecting duplicate or out-of-order times.
    pub fn from_candles(
        pair: impl Into<String>,
        timeframe: Timeframe,
        candles: Vec<Candle>,
    ) -> Result<Self, SeriesError> {
        for w in candles.windows(2) {
            if w[1].open_time <= w[0].open_time {
                return Err(SeriesError::NonIncreasingTime {
                    last: w[0].open_time,
                    got: w[1].open_time,
                });
            }
        }
        Ok(Self {
            pair: pair.into(),
            timeframe,
            candles,
        })
    }

    /// Wrap candles the caller has produced in strictly increasing time order.
    pub(crate) fn from_ordered(
        pair: impl Into<String>,
        timeframe: Timeframe,
        candles: Vec<Candle>,
    ) -> Self {
        debug_assert!(candles.windows(2).all(|w| w[0].open_time < w[1].open_time));
        Self {
            pair: pair.into(),
            timeframe,
            candles,
        }
    }

    /// Append a candle. Its `open_time` must be strictly after the last one.
    pub fn push(&mut self, candle: Candle) -> Result<(), SeriesError> {
        if let Some(last) = self.candles.last() {
            if candle.open_time <= last.open_time {
                return Err(SeriesError::NonIncreasingTime {
                    last: last.open_time,
                    got: candle.open_time,
                });
            }
        }
        self.candles.push(candle);
        Ok(())
    }

    pub fn pair(&self) -> &str {
        &self.pair
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// Copy of the first `len` candles (clamped), as seen at that point in time.
    pub fn truncated(&self, len: usize) -> Self {
        Self {
            pair: self.pair.clone(),
            timeframe: self.timeframe,
            candles: self.candles[..len.min(self.candles.len())].to_vec(),
        }
    }

    /// Index of the candle whose interval contains `time`: the last candle
    /// with `open_time <= time`.
    pub fn index_at(&self, time: DateTime<Utc>) -> Option<usize> {
        let idx = self.candles.partition_point(|c| c.open_time <= time);
        idx.checked_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn candle_at(minutes: i64, close: f64) -> Candle {
        Candle {
            open_time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                + Duration::minutes(minutes),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 100.0,
        }
    }

    #[test]
    fn push_accepts_increasing_times() {
        let mut series = CandleSeries::new("ETH/USDT", Timeframe::minutes(5));
        series.push(candle_at(0, 100.0)).unwrap();
        series.push(candle_at(5, 101.0)).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.last().unwrap().close, 101.0);
    }

    #[test]
    fn push_rejects_duplicate_time() {
        let mut series = CandleSeries::new("ETH/USDT", Timeframe::minutes(5));
        series.push(candle_at(5, 100.0)).unwrap();
        let err = series.push(candle_at(5, 101.0)).unwrap_err();
        assert!(matches!(err, SeriesError::NonIncreasingTime { .. }));
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn from_candles_rejects_out_of_order() {
        let candles = vec![candle_at(10, 1.0), candle_at(5, 1.0)];
        assert!(CandleSeries::from_candles("X", Timeframe::minutes(5), candles).is_err());
    }

    #[test]
    fn index_at_finds_containing_candle() {
        let candles = vec![candle_at(0, 1.0), candle_at(5, 2.0), candle_at(10, 3.0)];
        let series = CandleSeries::from_candles("X", Timeframe::minutes(5), candles).unwrap();
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(series.index_at(t0 - Duration::minutes(1)), None);
        assert_eq!(series.index_at(t0), Some(0));
        assert_eq!(series.index_at(t0 + Duration::minutes(7)), Some(1));
        assert_eq!(series.index_at(t0 + Duration::hours(2)), Some(2));
    }

    #[test]
    fn truncated_clamps_length() {
        let candles = vec![candle_at(0, 1.0), candle_at(5, 2.0)];
        let series = CandleSeries::from_candles("X", Timeframe::minutes(5), candles).unwrap();
        assert_eq!(series.truncated(1).len(), 1);
        assert_eq!(series.truncated(10).len(), 2);
    }
}
