//! Money Flow Index (MFI): volume-weighted RSI over typical price.
//!
//! raw_flow[t] = typical[t] * volume[t], signed by the direction of typical price.
//! MFI = 100 - 100 / (1 + sum(pos_flow) / sum(neg_flow)) over `period` changes.
//! Lookback: period.

use crate::domain::Candle;

use super::Indicator;

#[derive(Debug, Clone)]
pub struct Mfi {
    period: usize,
    name: String,
}

impl Mfi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "MFI period must be >= 1");
        Self {
            period,
            name: format!("mfi_{period}"),
        }
    }
}

impl Indicator for Mfi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let n = candles.len();
        let mut result = vec![f64::NAN; n];
        if n <= self.period {
            return result;
        }

        let typical: Vec<f64> = candles.iter().map(Candle::typical_price).collect();
        let mut pos = vec![f64::NAN; n];
        let mut neg = vec![f64::NAN; n];
        for i in 1..n {
            let flow = typical[i] * candles[i].volume;
            let change = typical[i] - typical[i - 1];
            if !flow.is_finite() || !change.is_finite() {
                continue;
            }
            pos[i] = if change > 0.0 { flow } else { 0.0 };
            neg[i] = if change < 0.0 { flow } else { 0.0 };
        }

        for i in self.period..n {
            let window = (i + 1 - self.period)..=i;
            let p = &pos[window.clone()];
            let m = &neg[window];
            if p.iter().chain(m).any(|v| v.is_nan()) {
                continue;
            }
            let p: f64 = p.iter().sum();
            let m: f64 = m.iter().sum();
            result[i] = if p == 0.0 && m == 0.0 {
                50.0
            } else if m == 0.0 {
                100.0
            } else {
                100.0 - 100.0 / (1.0 + p / m)
            };
        }

        result
    }
}
