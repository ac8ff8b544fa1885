//! Rolling extrema: highest high / lowest low over a trailing window.
//!
//! Used directly as support / resistance and as the building block of the
//! cloud lines. Any non-finite value inside the window makes that index
//! undefined.
//! Lookback: period - 1.

use crate::domain::Candle;

use super::Indicator;

/// Which extreme of the window to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollingExtreme {
    /// max(high) over the window.
    High,
    /// min(low) over the window.
    Low,
}

#[derive(Debug, Clone)]
pub struct RollingHigh {
    period: usize,
    name: String,
}

#[derive(Debug, Clone)]
pub struct RollingLow {
    period: usize,
    name: String,
}

impl RollingHigh {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "rolling high period must be >= 1");
        Self {
            period,
            name: format!("rolling_high_{period}"),
        }
    }
}

impl RollingLow {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "rolling low period must be >= 1");
        Self {
            period,
            name: format!("rolling_low_{period}"),
        }
    }
}

impl Indicator for RollingHigh {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let highs: Vec<f64> = candles.iter().map(|c| c.high).collect();
        rolling(&highs, self.period, RollingExtreme::High)
    }
}

impl Indicator for RollingLow {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let lows: Vec<f64> = candles.iter().map(|c| c.low).collect();
        rolling(&lows, self.period, RollingExtreme::Low)
    }
}

/// Rolling max or min of an arbitrary series.
pub fn rolling(values: &[f64], period: usize, extreme: RollingExtreme) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    for i in (period - 1)..n {
        let window = &values[i + 1 - period..=i];
        if window.iter().any(|v| !v.is_finite()) {
            continue;
        }
        result[i] = match extreme {
            RollingExtreme::High => window.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            RollingExtreme::Low => window.iter().copied().fold(f64::INFINITY, f64::min),
        };
    }

    result
}

/// Midpoint of the rolling high and rolling low: (max(high) + min(low)) / 2.
pub fn rolling_midpoint(candles: &[Candle], period: usize) -> Vec<f64> {
    let hi = RollingHigh::new(period).compute(candles);
    let lo = RollingLow::new(period).compute(candles);
    hi.iter().zip(&lo).map(|(h, l)| (h + l) / 2.0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_ohlc_candles, DEFAULT_EPSILON};

    fn candles() -> Vec<Candle> {
        make_ohlc_candles(&[
            (10.0, 12.0, 9.0, 11.0),
            (11.0, 15.0, 10.0, 14.0),
            (14.0, 14.5, 8.0, 9.0),
            (9.0, 11.0, 8.5, 10.0),
        ])
    }

    #[test]
    fn rolling_high_3() {
        let result = RollingHigh::new(3).compute(&candles());
        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_approx(result[2], 15.0, DEFAULT_EPSILON);
        assert_approx(result[3], 15.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rolling_low_3() {
        let result = RollingLow::new(3).compute(&candles());
        assert_approx(result[2], 8.0, DEFAULT_EPSILON);
        assert_approx(result[3], 8.0, DEFAULT_EPSILON);
    }

    #[test]
    fn midpoint_2() {
        let result = rolling_midpoint(&candles(), 2);
        // idx1: (15 + 9) / 2 = 12; idx3: (14.5 + 8) / 2 = 11.25
        assert_approx(result[1], 12.0, DEFAULT_EPSILON);
        assert_approx(result[3], 11.25, DEFAULT_EPSILON);
    }

    #[test]
    fn nan_in_window_is_undefined() {
        let result = rolling(&[1.0, f64::NAN, 3.0, 4.0], 2, RollingExtreme::High);
        assert!(result[1].is_nan());
        assert!(result[2].is_nan());
        assert_approx(result[3], 4.0, DEFAULT_EPSILON);
    }
}
