//! Provider traits for engine inputs.
//!
//! The engine never fetches market data or tracks orders itself. A host
//! implements these two traits over whatever it has (exchange client, cache,
//! test fixture) and calls `RegimeEngine::evaluate_with`.

use std::collections::HashMap;

use crate::domain::{CandleSeries, PositionState, Timeframe};

/// Source of candle history.
pub trait CandleProvider {
    /// Full available history for `pair` at `timeframe`, oldest first.
    /// `None` when the pair is unknown or has no data at that timeframe.
    fn candles(&self, pair: &str, timeframe: Timeframe) -> Option<CandleSeries>;
}

/// Read-only view of open positions.
pub trait PositionProvider {
    fn open_position(&self, pair: &str) -> Option<PositionState>;
}

impl CandleProvider for HashMap<String, CandleSeries> {
    fn candles(&self, pair: &str, timeframe: Timeframe) -> Option<CandleSeries> {
        self.get(pair)
            .filter(|series| series.timeframe() == timeframe)
            .cloned()
    }
}

impl PositionProvider for HashMap<String, PositionState> {
    fn open_position(&self, pair: &str) -> Option<PositionState> {
        self.get(pair).copied().filter(|p| p.is_open)
    }
}

/// Provider with no open positions.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPositions;

impl PositionProvider for NoPositions {
    fn open_position(&self, _pair: &str) -> Option<PositionState> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn map_provider_checks_timeframe() {
        let mut map = HashMap::new();
        map.insert(
            "ETH/USDT".to_string(),
            CandleSeries::new("ETH/USDT", Timeframe::minutes(5)),
        );
        assert!(map.candles("ETH/USDT", Timeframe::minutes(5)).is_some());
        assert!(map.candles("ETH/USDT", Timeframe::minutes(60)).is_none());
        assert!(map.candles("SOL/USDT", Timeframe::minutes(5)).is_none());
    }

    #[test]
    fn closed_positions_are_hidden() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut map = HashMap::new();
        let mut closed = PositionState::open(t, 10.0);
        closed.is_open = false;
        map.insert("A".to_string(), PositionState::open(t, 10.0));
        map.insert("B".to_string(), closed);
        assert!(map.open_position("A").is_some());
        assert!(map.open_position("B").is_none());
        assert!(NoPositions.open_position("A").is_none());
    }
}
