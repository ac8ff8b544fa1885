//! ADX: Average Directional Index (Wilder).
//!
//! 1. +DM / -DM from consecutive candles
//! 2. Wilder-smooth +DM, -DM and TR
//! 3. +DI = 100 * sm(+DM) / sm(TR), -DI = 100 * sm(-DM) / sm(TR)
//! 4. DX = 100 * |+DI - -DI| / (+DI + -DI)
//! 5. ADX = Wilder-smoothed DX
//!
//! Lookback: 2 * period - 1 (period bars of DI smoothing, then period DX values).

use crate::domain::Candle;

use super::atr::true_range;
use super::ema::wilder_smooth;
use super::Indicator;

#[derive(Debug, Clone)]
pub struct Adx {
    period: usize,
    name: String,
}

impl Adx {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ADX period must be >= 1");
        Self {
            period,
            name: format!("adx_{period}"),
        }
    }
}

impl Indicator for Adx {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        2 * self.period - 1
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let n = candles.len();
        if n < 2 {
            return vec![f64::NAN; n];
        }

        let mut plus_dm = vec![f64::NAN; n];
        let mut minus_dm = vec![f64::NAN; n];
        for i in 1..n {
            let up = candles[i].high - candles[i - 1].high;
            let down = candles[i - 1].low - candles[i].low;
            if !up.is_finite() || !down.is_finite() {
                continue;
            }
            plus_dm[i] = if up > down && up > 0.0 { up } else { 0.0 };
            minus_dm[i] = if down > up && down > 0.0 { down } else { 0.0 };
        }

        let mut tr = true_range(candles);
        tr[0] = f64::NAN;
        let smooth_tr = wilder_smooth(&tr, self.period);
        let smooth_plus = wilder_smooth(&plus_dm, self.period);
        let smooth_minus = wilder_smooth(&minus_dm, self.period);

        let mut dx = vec![f64::NAN; n];
        for i in 0..n {
            let (tr, p, m) = (smooth_tr[i], smooth_plus[i], smooth_minus[i]);
            if tr.is_nan() || p.is_nan() || m.is_nan() || tr == 0.0 {
                continue;
            }
            let plus_di = 100.0 * p / tr;
            let minus_di = 100.0 * m / tr;
            let di_sum = plus_di + minus_di;
            dx[i] = if di_sum == 0.0 {
                0.0
            } else {
                100.0 * (plus_di - minus_di).abs() / di_sum
            };
        }

        wilder_smooth(&dx, self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_ohlc_candles;

    #[test]
    fn adx_stays_in_range_on_zigzag() {
        // Alternating 3-up / 2-down swings with uneven wicks.
        let data: Vec<_> = (0..30)
            .map(|i| {
                let swing = if i % 5 < 3 { 1.5 } else { -2.0 };
                let open = 2_000.0 + (i / 5) as f64 * 4.0 + (i % 5) as f64 * swing;
                let close = open + swing;
                let wick = 0.5 + (i % 3) as f64;
                (open, open.max(close) + wick, open.min(close) - wick, close)
            })
            .collect();
        let result = Adx::new(3).compute(&make_ohlc_candles(&data));
        assert!(result.iter().any(|v| !v.is_nan()));
        for (i, &v) in result.iter().enumerate() {
            if !v.is_nan() {
                assert!((0.0..=100.0).contains(&v), "ADX out of range at {i}: {v}");
            }
        }
    }

    #[test]
    fn adx_first_defined_at_lookback() {
        let data: Vec<_> = (0..20)
            .map(|i| {
                let b = 100.0 + i as f64;
                (b, b + 2.0, b - 1.0, b + 1.0)
            })
            .collect();
        let adx = Adx::new(5);
        let result = adx.compute(&make_ohlc_candles(&data));
        assert!(result[adx.lookback() - 1].is_nan());
        assert!(!result[adx.lookback()].is_nan());
    }

    #[test]
    fn adx_strong_trend_is_high() {
        let data: Vec<_> = (0..40)
            .map(|i| {
                let b = 100.0 + i as f64 * 5.0;
                (b - 1.0, b + 3.0, b - 3.0, b + 2.0)
            })
            .collect();
        let result = Adx::new(5).compute(&make_ohlc_candles(&data));
        let last = *result.last().unwrap();
        assert!(last > 50.0, "ADX should be high in a one-way trend, got {last}");
    }

    #[test]
    fn adx_too_few_candles() {
        let candles = make_ohlc_candles(&[(100.0, 105.0, 95.0, 102.0)]);
        assert!(Adx::new(3).compute(&candles).iter().all(|v| v.is_nan()));
    }
}
