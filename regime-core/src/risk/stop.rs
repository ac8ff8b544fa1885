//! Stop-level proposals for an open long position.
//!
//! - `percent`: baseline at open × (1 + initial_stop). Once unrealized profit
//!   exceeds `trailing_activation` the proposal follows price at
//!   `trailing_distance` below it (never under the baseline).
//! - `atr`: stop at open − ATR × stop_multiple and take-profit at
//!   open + ATR × target_multiple, where ATR is the value frozen at the
//!   trade's opening candle.
//!
//! A proposal is only a candidate: the engine feeds it through the trade's
//! `RatchetState`. Undefined inputs produce `None`, which the ratchet treats
//! as "no change".

use crate::domain::PositionState;
use crate::rules::StopParams;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StopProposal {
    pub stop: Option<f64>,
    pub take_profit: Option<f64>,
}

pub fn propose_stop(
    params: &StopParams,
    position: &PositionState,
    close: Option<f64>,
    atr_at_open: Option<f64>,
) -> StopProposal {
    let open = position.open_price;
    if !(open.is_finite() && open > 0.0) {
        return StopProposal::default();
    }

    match *params {
        StopParams::Percent {
            initial_stop,
            trailing_activation,
            trailing_distance,
        } => {
            let baseline = open * (1.0 + initial_stop);
            let trail = match (trailing_activation, trailing_distance, close) {
                (Some(activation), Some(distance), Some(close)) => position
                    .profit_ratio(close)
                    .filter(|&profit| profit > activation)
                    .map(|_| close * (1.0 - distance)),
                _ => None,
            };
            StopProposal {
                stop: Some(trail.map_or(baseline, |t| t.max(baseline))),
                take_profit: None,
            }
        }
        StopParams::Atr {
            stop_multiple,
            target_multiple,
        } => {
            let Some(atr) = atr_at_open.filter(|a| a.is_finite() && *a > 0.0) else {
                return StopProposal::default();
            };
            StopProposal {
                stop: Some(open - atr * stop_multiple),
                take_profit: target_multiple.map(|m| open + atr * m),
            }
        }
    }
}
