//! Exit reasons.
//!
//! Each reason is checked independently; the result lists every reason that
//! fired, ordered by `ExitReason` priority. Profit-based checks use the raw
//! close, indicator-based checks use the decision price.

use crate::domain::{ExitReason, PositionState};
use crate::frame::{Column, FrameRow};
use crate::risk::{roi_threshold, MaxHoldingPeriod};
use crate::rules::ExitRules;

/// Everything the exit check needs for one open position.
#[derive(Debug, Clone, Copy)]
pub struct ExitInputs<'a> {
    pub row: FrameRow<'a>,
    pub rules: &'a ExitRules,
    pub position: &'a PositionState,
    /// Position age in candles at `row`.
    pub age: u64,
    pub max_hold_period: Option<u64>,
    /// Active (ratcheted) stop level.
    pub stop_level: Option<f64>,
    /// ATR take-profit level, if the stop mode defines one.
    pub take_profit: Option<f64>,
}

pub fn evaluate_exits(inputs: &ExitInputs<'_>) -> Vec<ExitReason> {
    let row = &inputs.row;
    let rules = inputs.rules;
    let close = row.get(Column::Close);
    let price = row.get(Column::Price);
    let profit = close.and_then(|c| inputs.position.profit_ratio(c));
    let mut reasons = Vec::new();

    if let (Some(c), Some(stop)) = (close, inputs.stop_level) {
        if c <= stop {
            reasons.push(ExitReason::StopLoss);
        }
    }

    if let Some(max) = inputs.max_hold_period {
        if MaxHoldingPeriod::new(max).is_due(inputs.age) {
            reasons.push(ExitReason::MaxHoldPeriod);
        }
    }

    if let (Some(c), Some(target)) = (close, inputs.take_profit) {
        if c >= target {
            reasons.push(ExitReason::AtrTakeProfit);
        }
    }

    if let (Some(p), Some(target)) = (profit, rules.profit_target) {
        if p >= target {
            reasons.push(ExitReason::ProfitTarget);
        }
    }

    if let (Some(p), Some(min_profit)) = (profit, roi_threshold(&rules.roi, inputs.age)) {
        if p >= min_profit {
            reasons.push(ExitReason::Roi);
        }
    }

    if let Some(margin) = rules.resistance_margin {
        if let (Some(p), Some(res)) = (price, row.get(Column::Resistance)) {
            if p >= res * (1.0 - margin) {
                reasons.push(ExitReason::ResistanceTouch);
            }
        }
    }

    if let Some(momentum) = &rules.momentum {
        let rsi_weak = row.get(Column::Rsi).is_some_and(|rsi| rsi < momentum.rsi_below);
        let mfi_weak = match momentum.mfi_below {
            Some(floor) => row.get(Column::Mfi).is_some_and(|mfi| mfi < floor),
            None => true,
        };
        let under_ma = if momentum.below_fast_ma {
            price
                .zip(row.get(Column::MaFast))
                .is_some_and(|(p, ma)| p < ma)
        } else {
            true
        };
        if rsi_weak && mfi_weak && under_ma {
            reasons.push(ExitReason::MomentumLoss);
        }
    }

    if rules.exit_on_cloud_cross {
        if let (Some(tenkan), Some(kijun)) = (row.get(Column::Tenkan), row.get(Column::Kijun)) {
            if tenkan < kijun {
                reasons.push(ExitReason::CloudCross);
            }
        }
    }

    reasons.sort();
    reasons.dedup();
    reasons
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::IndicatorFrame;
    use crate::rules::{MomentumExit, RoiStep};
    use chrono::{TimeZone, Utc};

    fn position() -> PositionState {
        PositionState::open(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), 100.0)
    }

    fn frame(close: f64) -> IndicatorFrame {
        let mut frame = IndicatorFrame::new(1, 1);
        frame.insert(Column::Close, vec![close]);
        frame.insert(Column::Price, vec![close]);
        frame
    }

    fn no_exits() -> ExitRules {
        ExitRules {
            roi: Vec::new(),
            ..ExitRules::default()
        }
    }

    fn check(frame: &IndicatorFrame, rules: &ExitRules, stop: Option<f64>, age: u64) -> Vec<ExitReason> {
        let pos = position();
        evaluate_exits(&ExitInputs {
            row: frame.latest().unwrap(),
            rules,
            position: &pos,
            age,
            max_hold_period: Some(240),
            stop_level: stop,
            take_profit: None,
        })
    }

    #[test]
    fn stop_loss_at_or_below_stop() {
        let rules = no_exits();
        assert_eq!(check(&frame(95.5), &rules, Some(96.0), 3), vec![ExitReason::StopLoss]);
        assert!(check(&frame(96.5), &rules, Some(96.0), 3).is_empty());
        assert!(check(&frame(95.5), &rules, None, 3).is_empty());
    }

    #[test]
    fn max_hold_ignores_price() {
        let rules = no_exits();
        assert!(check(&frame(150.0), &rules, None, 239).is_empty());
        assert_eq!(check(&frame(150.0), &rules, None, 240), vec![ExitReason::MaxHoldPeriod]);
        assert_eq!(check(&frame(50.0), &rules, None, 241), vec![ExitReason::MaxHoldPeriod]);
    }

    #[test]
    fn profit_target_and_roi_can_fire_together() {
        let rules = ExitRules {
            profit_target: Some(0.03),
            roi: vec![RoiStep {
                after_candles: 0,
                min_profit: 0.02,
            }],
            ..ExitRules::default()
        };
        assert_eq!(
            check(&frame(104.0), &rules, Some(90.0), 1),
            vec![ExitReason::ProfitTarget, ExitReason::Roi]
        );
        assert_eq!(check(&frame(102.5), &rules, Some(90.0), 1), vec![ExitReason::Roi]);
    }

    #[test]
    fn resistance_touch_with_margin() {
        let mut f = frame(99.6);
        f.insert(Column::Resistance, vec![100.0]);
        let rules = ExitRules {
            resistance_margin: Some(0.005),
            ..no_exits()
        };
        assert_eq!(check(&f, &rules, None, 1), vec![ExitReason::ResistanceTouch]);
    }

    #[test]
    fn momentum_loss_needs_all_confirmations() {
        let mut f = frame(99.0);
        f.insert(Column::Rsi, vec![45.0]);
        f.insert(Column::Mfi, vec![55.0]);
        f.insert(Column::MaFast, vec![100.0]);
        let mut rules = ExitRules {
            momentum: Some(MomentumExit {
                rsi_below: 50.0,
                mfi_below: Some(50.0),
                below_fast_ma: true,
            }),
            ..no_exits()
        };
        assert!(check(&f, &rules, None, 1).is_empty());

        rules.momentum = Some(MomentumExit {
            rsi_below: 50.0,
            mfi_below: None,
            below_fast_ma: true,
        });
        assert_eq!(check(&f, &rules, None, 1), vec![ExitReason::MomentumLoss]);
    }

    #[test]
    fn cloud_cross_when_enabled() {
        let mut f = frame(100.0);
        f.insert(Column::Tenkan, vec![99.0]);
        f.insert(Column::Kijun, vec![100.0]);
        let mut rules = no_exits();
        assert!(check(&f, &rules, None, 1).is_empty());
        rules.exit_on_cloud_cross = true;
        assert_eq!(check(&f, &rules, None, 1), vec![ExitReason::CloudCross]);
    }

    #[test]
    fn atr_take_profit() {
        let f = frame(103.1);
        let pos = position();
        let rules = no_exits();
        let reasons = evaluate_exits(&ExitInputs {
            row: f.latest().unwrap(),
            rules: &rules,
            position: &pos,
            age: 2,
            max_hold_period: None,
            stop_level: Some(98.0),
            take_profit: Some(103.0),
        });
        assert_eq!(reasons, vec![ExitReason::AtrTakeProfit]);
    }

    #[test]
    fn reasons_are_ordered_by_priority() {
        let mut f = frame(80.0);
        f.insert(Column::Tenkan, vec![90.0]);
        f.insert(Column::Kijun, vec![95.0]);
        let rules = ExitRules {
            exit_on_cloud_cross: true,
            ..no_exits()
        };
        assert_eq!(
            check(&f, &rules, Some(96.0), 300),
            vec![ExitReason::StopLoss, ExitReason::MaxHoldPeriod, ExitReason::CloudCross]
        );
    }
}
