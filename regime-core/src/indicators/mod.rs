//! Concrete indicator implementations.
//!
//! Single-series indicators implement [`Indicator`]: candle history in, a
//! numeric series of the same length out, with `f64::NAN` marking every index
//! where the value is undefined (warm-up or NaN upstream data). Composite
//! columns (cloud bands, ratios, benchmark alignment) are plain functions over
//! already-computed series and are assembled by the pipeline in
//! [`crate::frame`].
//!
//! # Look-ahead contamination guard
//! No indicator value at index t may depend on candles at t+1 or later.
//! `tests/lookahead_test.rs` checks every indicator on truncated vs full input.

pub mod adx;
pub mod atr;
pub mod ema;
pub mod extrema;
pub mod heikin_ashi;
pub mod ichimoku;
pub mod mfi;
pub mod ratio;
pub mod relative;
pub mod rsi;
pub mod sma;

pub use adx::Adx;
pub use atr::Atr;
pub use ema::Ema;
pub use extrema::{RollingExtreme, RollingHigh, RollingLow};
pub use heikin_ashi::heikin_ashi_close;
pub use ichimoku::{Cloud, CloudParams};
pub use mfi::Mfi;
pub use relative::align_benchmark_closes;
pub use rsi::Rsi;
pub use sma::Sma;

use crate::domain::Candle;

/// Trait for indicators computed from raw candles.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "ema_25", "atr_14").
    fn name(&self) -> &str;

    /// Number of leading indices that are always undefined.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the whole candle history.
    ///
    /// Returns a `Vec<f64>` of the same length as `candles`.
    fn compute(&self, candles: &[Candle]) -> Vec<f64>;
}

/// Create synthetic 5-minute candles from close prices for testing.
///
/// open = prev_close (or close for the first candle),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<Candle> {
    use chrono::{Duration, TimeZone, Utc};
    let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle {
                open_time: base + Duration::minutes(5 * i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Create candles from explicit (open, high, low, close) tuples for testing.
#[cfg(test)]
pub fn make_ohlc_candles(data: &[(f64, f64, f64, f64)]) -> Vec<Candle> {
    use chrono::{Duration, TimeZone, Utc};
    let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| Candle {
            open_time: base + Duration::minutes(5 * i as i64),
            open,
            high,
            low,
            close,
            volume: 1000.0,
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
