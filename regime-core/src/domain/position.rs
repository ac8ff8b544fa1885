//! Open-position view supplied by the execution layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Timeframe;

/// Read-only snapshot of the pair's current long position.
///
/// Owned by the execution layer. The engine reads it and only ever returns a
/// recommended stop level or exit flag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionState {
    pub open_time: DateTime<Utc>,
    pub open_price: f64,
    pub is_open: bool,
}

impl PositionState {
    pub fn open(open_time: DateTime<Utc>, open_price: f64) -> Self {
        Self {
            open_time,
            open_price,
            is_open: true,
        }
    }

    /// Unrealized profit as a ratio of the open price (0.02 = +2%).
    ///
    /// `None` when either price is unusable.
    pub fn profit_ratio(&self, price: f64) -> Option<f64> {
        if !self.open_price.is_finite() || self.open_price <= 0.0 || !price.is_finite() {
            return None;
        }
        Some(price / self.open_price - 1.0)
    }

    /// Position age in whole candles at `now`.
    pub fn age_in_candles(&self, now: DateTime<Utc>, timeframe: Timeframe) -> u64 {
        timeframe.bars_between(self.open_time, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn profit_ratio_long() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let pos = PositionState::open(t, 100.0);
        assert!((pos.profit_ratio(103.0).unwrap() - 0.03).abs() < 1e-12);
        assert!((pos.profit_ratio(96.0).unwrap() + 0.04).abs() < 1e-12);
    }

    #[test]
    fn profit_ratio_rejects_bad_prices() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert!(PositionState::open(t, 0.0).profit_ratio(1.0).is_none());
        assert!(PositionState::open(t, 100.0).profit_ratio(f64::NAN).is_none());
    }

    #[test]
    fn age_counts_candles() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let pos = PositionState::open(t, 100.0);
        let tf = Timeframe::minutes(5);
        assert_eq!(pos.age_in_candles(t + Duration::minutes(50), tf), 10);
    }
}
