//! Heikin-Ashi close: a smoothed decision price.
//!
//! HA_close = (open + high + low + close) / 4. Only the close is used by the
//! engine, so the recursive HA open is not computed.

use crate::domain::Candle;

pub fn heikin_ashi_close(candles: &[Candle]) -> Vec<f64> {
    candles
        .iter()
        .map(|c| (c.open + c.high + c.low + c.close) / 4.0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_ohlc_candles, DEFAULT_EPSILON};

    #[test]
    fn averages_ohlc() {
        let candles = make_ohlc_candles(&[(10.0, 14.0, 8.0, 12.0)]);
        assert_approx(heikin_ashi_close(&candles)[0], 11.0, DEFAULT_EPSILON);
    }

    #[test]
    fn nan_propagates() {
        let mut candles = make_ohlc_candles(&[(10.0, 14.0, 8.0, 12.0)]);
        candles[0].low = f64::NAN;
        assert!(heikin_ashi_close(&candles)[0].is_nan());
    }
}
