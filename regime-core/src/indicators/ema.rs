//! Exponential Moving Average (EMA) and the shared recursive smoother.
//!
//! Recursive: EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1], alpha = 2 / (period + 1).
//! Seed: SMA of the first `period` valid values.
//! Lookback: period - 1.
//! A non-finite input breaks the recursion; the smoother re-seeds from the
//! next `period` valid values instead of staying undefined forever.

use crate::domain::Candle;

use super::Indicator;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            name: format!("ema_{period}"),
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        ema_of_series(&closes, self.period)
    }
}

/// EMA of an arbitrary series.
pub fn ema_of_series(values: &[f64], period: usize) -> Vec<f64> {
    recursive_smooth(values, period, 2.0 / (period as f64 + 1.0))
}

/// Wilder smoothing (alpha = 1/period), used by RSI, ATR and ADX.
pub fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    recursive_smooth(values, period, 1.0 / period.max(1) as f64)
}

/// SMA-seeded recursive smoothing with the given alpha.
pub(crate) fn recursive_smooth(values: &[f64], period: usize, alpha: f64) -> Vec<f64> {
    let mut result = vec![f64::NAN; values.len()];
    if period == 0 {
        return result;
    }

    let mut prev: Option<f64> = None;
    let mut run = 0usize;
    let mut sum = 0.0;

    for (i, &v) in values.iter().enumerate() {
        if !v.is_finite() {
            prev = None;
            run = 0;
            sum = 0.0;
            continue;
        }
        match prev {
            Some(p) => {
                let smoothed = alpha * v + (1.0 - alpha) * p;
                result[i] = smoothed;
                prev = Some(smoothed);
            }
            None => {
                run += 1;
                sum += v;
                if run == period {
                    let seed = sum / period as f64;
                    result[i] = seed;
                    prev = Some(seed);
                }
            }
        }
    }

    result
}
