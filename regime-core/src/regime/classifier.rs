//! Regime classifier: maps the latest indicator row of the regime source to
//! BULL / CHOPPY / BEAR / NEUTRAL.
//!
//! Conditions (first match wins, precedence BULL > CHOPPY > BEAR > NEUTRAL):
//! - BULL:   ADX > adx_trend, fast MA > slow MA, ATR% > bull_min_atr_pct
//! - CHOPPY: ADX < adx_range, MA spread < choppy_max_spread,
//!           ATR% < choppy_max_atr_pct
//! - BEAR:   fast MA < slow MA, ADX > adx_trend
//! - NEUTRAL otherwise
//!
//! With `price_confirmation` the close must also sit on the trend side of the
//! fast MA for BULL and BEAR.
//!
//! When the source is too short or a required input is undefined the outcome
//! is `Indeterminate` and the previous `RegimeState` is carried forward.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{Regime, RegimeState};
use crate::frame::{Column, FrameRow, IndicatorFrame};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Minimum regime-source candles before classifying.
    pub min_candles: usize,
    pub adx_trend: f64,
    pub adx_range: f64,
    pub bull_min_atr_pct: f64,
    pub choppy_max_spread: f64,
    pub choppy_max_atr_pct: f64,
    pub price_confirmation: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_candles: 100,
            adx_trend: 25.0,
            adx_range: 20.0,
            bull_min_atr_pct: 0.01,
            choppy_max_spread: 0.03,
            choppy_max_atr_pct: 0.008,
            price_confirmation: false,
        }
    }
}

/// Why a classification could not be made.
#[derive(Debug, Clone, PartialEq)]
pub enum Indeterminate {
    TooFewCandles { have: usize, need: usize },
    MissingBenchmark,
    StaleBenchmark { age_bars: u64, max_bars: u64 },
    Undefined(Column),
}

impl fmt::Display for Indeterminate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Indeterminate::TooFewCandles { have, need } => {
                write!(f, "too few candles ({have} < {need})")
            }
            Indeterminate::MissingBenchmark => f.write_str("benchmark series missing"),
            Indeterminate::StaleBenchmark { age_bars, max_bars } => {
                write!(f, "benchmark stale ({age_bars} bars > {max_bars})")
            }
            Indeterminate::Undefined(col) => write!(f, "{col:?} undefined at latest row"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Classified(Regime),
    Indeterminate(Indeterminate),
}

impl Classification {
    pub fn regime(&self) -> Option<Regime> {
        match self {
            Classification::Classified(r) => Some(*r),
            Classification::Indeterminate(_) => None,
        }
    }

    /// Next regime state: a classified outcome overwrites `previous`, an
    /// indeterminate one leaves it untouched.
    pub fn apply(&self, previous: RegimeState, at: DateTime<Utc>) -> RegimeState {
        match self {
            Classification::Classified(label) => RegimeState {
                label: *label,
                last_updated: Some(at),
            },
            Classification::Indeterminate(_) => previous,
        }
    }
}

struct Inputs {
    adx: f64,
    fast: f64,
    slow: f64,
    atr_pct: f64,
    spread: f64,
    close: f64,
}

impl Inputs {
    fn read(row: &FrameRow<'_>) -> Result<Self, Indeterminate> {
        let get = |col: Column| row.get(col).ok_or(Indeterminate::Undefined(col));
        Ok(Self {
            adx: get(Column::Adx)?,
            fast: get(Column::MaFast)?,
            slow: get(Column::MaSlow)?,
            atr_pct: get(Column::AtrPct)?,
            spread: get(Column::MaSpread)?,
            close: get(Column::Close)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RegimeClassifier {
    config: ClassifierConfig,
}

impl RegimeClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify the latest row of the regime-source frame.
    pub fn classify(&self, frame: &IndicatorFrame) -> Classification {
        if frame.len() < self.config.min_candles {
            return Classification::Indeterminate(Indeterminate::TooFewCandles {
                have: frame.len(),
                need: self.config.min_candles,
            });
        }
        match frame.latest() {
            Some(row) => self.classify_row(&row),
            None => Classification::Indeterminate(Indeterminate::TooFewCandles {
                have: 0,
                need: self.config.min_candles.max(1),
            }),
        }
    }

    /// Pure per-row classification, ignoring history length.
    pub fn classify_row(&self, row: &FrameRow<'_>) -> Classification {
        let Inputs {
            adx,
            fast,
            slow,
            atr_pct,
            spread,
            close,
        } = match Inputs::read(row) {
            Ok(inputs) => inputs,
            Err(reason) => return Classification::Indeterminate(reason),
        };

        let c = &self.config;
        let confirm_up = !c.price_confirmation || close > fast;
        let confirm_down = !c.price_confirmation || close < fast;

        let regime = if adx > c.adx_trend && fast > slow && atr_pct > c.bull_min_atr_pct && confirm_up
        {
            Regime::Bull
        } else if adx < c.adx_range && spread < c.choppy_max_spread && atr_pct < c.choppy_max_atr_pct
        {
            Regime::Choppy
        } else if fast < slow && adx > c.adx_trend && confirm_down {
            Regime::Bear
        } else {
            Regime::Neutral
        };

        tracing::debug!(
            regime = %regime,
            adx,
            fast,
            slow,
            atr_pct,
            spread,
            "regime classified"
        );
        Classification::Classified(regime)
    }
}
