//! Ichimoku cloud: conversion/base lines and forward-displaced span bands.
//!
//! - Tenkan (conversion) = rolling midpoint over `conversion` bars
//! - Kijun (base) = rolling midpoint over `base` bars
//! - Span A origin = (Tenkan + Kijun) / 2
//! - Span B origin = rolling midpoint over `span_b` bars
//!
//! Spans are shifted forward by `displacement`: the value stored at index i
//! originated at index i - displacement, so a decision at i only sees band
//! values built from candles <= i - displacement. The lagging span (close
//! shifted backwards) is deliberately not produced.

use serde::{Deserialize, Serialize};

use crate::domain::Candle;

use super::extrema::rolling_midpoint;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudParams {
    pub conversion: usize,
    pub base: usize,
    pub span_b: usize,
    pub displacement: usize,
}

impl Default for CloudParams {
    fn default() -> Self {
        Self {
            conversion: 20,
            base: 60,
            span_b: 120,
            displacement: 30,
        }
    }
}

impl CloudParams {
    /// Leading undefined indices of the displayed span bands.
    pub fn lookback(&self) -> usize {
        let origin = self.conversion.max(self.base).max(self.span_b);
        origin.saturating_sub(1) + self.displacement
    }
}

/// All cloud lines, aligned to the candle index at which they are read.
#[derive(Debug, Clone, PartialEq)]
pub struct Cloud {
    pub tenkan: Vec<f64>,
    pub kijun: Vec<f64>,
    pub senkou_a: Vec<f64>,
    pub senkou_b: Vec<f64>,
}

impl Cloud {
    pub fn compute(candles: &[Candle], params: &CloudParams) -> Self {
        let tenkan = rolling_midpoint(candles, params.conversion);
        let kijun = rolling_midpoint(candles, params.base);
        let span_a: Vec<f64> = tenkan.iter().zip(&kijun).map(|(t, k)| (t + k) / 2.0).collect();
        let span_b = rolling_midpoint(candles, params.span_b);

        Self {
            senkou_a: displace(&span_a, params.displacement),
            senkou_b: displace(&span_b, params.displacement),
            tenkan,
            kijun,
        }
    }
}

/// Shift a series forward: out[i] = values[i - by], undefined for i < by.
pub fn displace(values: &[f64], by: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if by < n {
        out[by..].copy_from_slice(&values[..n - by]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles, DEFAULT_EPSILON};

    fn small() -> CloudParams {
        CloudParams {
            conversion: 2,
            base: 3,
            span_b: 4,
            displacement: 2,
        }
    }

    #[test]
    fn displace_shifts_forward() {
        let out = displace(&[1.0, 2.0, 3.0, 4.0], 2);
        assert!(out[0].is_nan());
        assert!(out[1].is_nan());
        assert_eq!(&out[2..], &[1.0, 2.0]);
    }

    #[test]
    fn displace_longer_than_series() {
        assert!(displace(&[1.0, 2.0], 5).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn spans_originate_displacement_bars_back() {
        let candles = make_candles(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17.0]);
        let p = small();
        let cloud = Cloud::compute(&candles, &p);
        let undisplaced_b = rolling_midpoint(&candles, p.span_b);
        for i in p.displacement..candles.len() {
            let expected = undisplaced_b[i - p.displacement];
            if expected.is_nan() {
                assert!(cloud.senkou_b[i].is_nan());
            } else {
                assert_approx(cloud.senkou_b[i], expected, DEFAULT_EPSILON);
            }
        }
    }

    #[test]
    fn lookback_matches_first_defined_span_b() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let candles = make_candles(&closes);
        let p = small();
        let cloud = Cloud::compute(&candles, &p);
        assert!(cloud.senkou_b[p.lookback() - 1].is_nan());
        assert!(!cloud.senkou_b[p.lookback()].is_nan());
        assert!(!cloud.senkou_a[p.lookback()].is_nan());
    }
}
