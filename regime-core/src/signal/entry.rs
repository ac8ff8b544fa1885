//! Entry predicates.
//!
//! One function evaluates whichever predicates the selected `EntryRules`
//! enable, plus the common ones. Every predicate over an undefined value is
//! false. The outcomes are kept so they can be logged alongside the decision.

use serde::Serialize;
use std::fmt;

use crate::config::CommonRules;
use crate::frame::{Column, FrameRow};
use crate::rules::EntryRules;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    RsiAbove,
    RsiBelow,
    VolumeSurge,
    AboveCloud,
    Pullback,
    Consolidation,
    NearSupport,
    MinAdx,
    RelativeStrength,
}

/// Outcome of one predicate: the value it looked at (if defined) and whether
/// it passed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredicateOutcome {
    pub predicate: Predicate,
    pub value: Option<f64>,
    pub passed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EntryEvaluation {
    pub outcomes: Vec<PredicateOutcome>,
    /// False when the regime's rules enable nothing.
    pub has_regime_predicates: bool,
}

impl EntryEvaluation {
    pub fn passed(&self) -> bool {
        self.has_regime_predicates && self.outcomes.iter().all(|o| o.passed)
    }

    pub fn outcome(&self, predicate: Predicate) -> Option<&PredicateOutcome> {
        self.outcomes.iter().find(|o| o.predicate == predicate)
    }

    pub fn failed(&self) -> impl Iterator<Item = Predicate> + '_ {
        self.outcomes.iter().filter(|o| !o.passed).map(|o| o.predicate)
    }
}

impl fmt::Display for EntryEvaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, o) in self.outcomes.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            let mark = if o.passed { '+' } else { '-' };
            match o.value {
                Some(v) => write!(f, "{mark}{:?}={v:.4}", o.predicate)?,
                None => write!(f, "{mark}{:?}=undefined", o.predicate)?,
            }
        }
        Ok(())
    }
}

/// Evaluate the entry conjunction at `row`.
pub fn evaluate_entry(row: &FrameRow<'_>, rules: &EntryRules, common: &CommonRules) -> EntryEvaluation {
    let mut outcomes = Vec::new();
    let mut push = |predicate, value: Option<f64>, test: &dyn Fn(f64) -> bool| {
        outcomes.push(PredicateOutcome {
            predicate,
            value,
            passed: value.is_some_and(test),
        });
    };

    let price = row.get(Column::Price);
    let rsi = row.get(Column::Rsi);

    if let Some(min) = rules.rsi_min {
        push(Predicate::RsiAbove, rsi, &|v| v > min);
    }
    if let Some(max) = rules.rsi_max {
        push(Predicate::RsiBelow, rsi, &|v| v < max);
    }
    if let Some(mult) = rules.volume_multiplier {
        push(Predicate::VolumeSurge, row.get(Column::VolumeRatio), &|v| v > mult);
    }
    if rules.above_cloud {
        let top = match (row.get(Column::SenkouA), row.get(Column::SenkouB)) {
            (Some(a), Some(b)) => Some(a.max(b)),
            _ => None,
        };
        let margin = price.zip(top).map(|(p, t)| p - t);
        push(Predicate::AboveCloud, margin, &|m| m > 0.0);
    }
    if let Some(max) = rules.max_pullback {
        push(Predicate::Pullback, row.get(Column::Pullback), &|v| v < max);
    }
    if let Some(bars) = rules.consolidation_bars {
        let streak = consolidation_streak(row, bars);
        push(Predicate::Consolidation, Some(streak as f64), &|v| v >= bars as f64);
    }
    if let Some(mult) = rules.support_atr_multiple {
        let ceiling = row
            .get(Column::Support)
            .zip(row.get(Column::Atr))
            .map(|(s, atr)| s + atr * mult);
        let headroom = price.zip(ceiling).map(|(p, c)| c - p);
        push(Predicate::NearSupport, headroom, &|h| h > 0.0);
    }
    if let Some(min) = rules.min_adx {
        push(Predicate::MinAdx, row.get(Column::Adx), &|v| v > min);
    }
    if let Some(floor) = common.min_relative_strength {
        push(Predicate::RelativeStrength, row.get(Column::RelativeStrength), &|v| {
            v > floor
        });
    }

    EntryEvaluation {
        outcomes,
        has_regime_predicates: !rules.is_empty(),
    }
}

/// Number of consecutive consolidating candles ending at `row`, capped at `max`.
fn consolidation_streak(row: &FrameRow<'_>, max: usize) -> usize {
    (0..max)
        .take_while(|&k| {
            row.back(k)
                .and_then(|r| r.get(Column::Consolidating))
                .is_some_and(|flag| flag > 0.5)
        })
        .count()
}
