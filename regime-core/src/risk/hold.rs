//! Max holding period: force exit after N candles regardless of price.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxHoldingPeriod {
    pub max_candles: u64,
}

impl MaxHoldingPeriod {
    pub fn new(max_candles: u64) -> Self {
        Self { max_candles }
    }

    /// True once the trade is `max_candles` old.
    pub fn is_due(&self, age_in_candles: u64) -> bool {
        age_in_candles >= self.max_candles
    }
}
