//! Decision: the output of one evaluation cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Regime;

/// Why an exit was recommended. Reasons are independent; several may fire
/// on the same candle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    MaxHoldPeriod,
    AtrTakeProfit,
    ProfitTarget,
    Roi,
    ResistanceTouch,
    MomentumLoss,
    CloudCross,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::StopLoss => "stop_loss",
            ExitReason::MaxHoldPeriod => "max_hold_period",
            ExitReason::AtrTakeProfit => "atr_take_profit",
            ExitReason::ProfitTarget => "profit_target",
            ExitReason::Roi => "roi",
            ExitReason::ResistanceTouch => "resistance_touch",
            ExitReason::MomentumLoss => "momentum_loss",
            ExitReason::CloudCross => "cloud_cross",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry/exit recommendation for the latest candle of one pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub pair: String,
    /// Open time of the evaluated candle; `None` for an empty series.
    pub evaluated_at: Option<DateTime<Utc>>,
    pub regime: Regime,
    pub entry: bool,
    pub exit: bool,
    /// Sorted, duplicate-free. Non-empty iff `exit`.
    pub exit_reasons: Vec<ExitReason>,
    /// Recommended protective stop for the open position.
    pub stop_level: Option<f64>,
}

impl Decision {
    /// Inert decision: no entry, no exit, no stop.
    pub fn empty(pair: impl Into<String>, regime: Regime) -> Self {
        Self {
            pair: pair.into(),
            evaluated_at: None,
            regime,
            entry: false,
            exit: false,
            exit_reasons: Vec::new(),
            stop_level: None,
        }
    }

    /// Primary exit reason (highest priority of those triggered).
    pub fn exit_reason(&self) -> Option<ExitReason> {
        self.exit_reasons.first().copied()
    }

    /// Merge exit reasons, keeping them sorted and unique, and update `exit`.
    pub fn add_exit_reasons(&mut self, reasons: impl IntoIterator<Item = ExitReason>) {
        self.exit_reasons.extend(reasons);
        self.exit_reasons.sort();
        self.exit_reasons.dedup();
        self.exit = !self.exit_reasons.is_empty();
    }
}
