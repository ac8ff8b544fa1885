//! Rule selection: per-regime parameter sets and the regime → rules table.
//!
//! Each regime owns one immutable `ParameterSet` (entry predicates, exit
//! rules, stop mode, max hold). The `RuleTable` is built once from config and
//! refuses to exist unless every regime is covered, so lookup never fails.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::domain::Regime;

/// Entry predicates. `None` / `false` disables a predicate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryRules {
    /// RSI must be strictly above this.
    pub rsi_min: Option<f64>,
    /// RSI must be strictly below this.
    pub rsi_max: Option<f64>,
    /// Volume / volume MA must exceed this.
    pub volume_multiplier: Option<f64>,
    /// Price above both cloud bands.
    pub above_cloud: bool,
    /// Pullback (pct change of price) must be below this, e.g. -0.03.
    pub max_pullback: Option<f64>,
    /// The consolidation flag must hold on each of the last N candles.
    pub consolidation_bars: Option<usize>,
    /// Price must be below support + ATR × multiple.
    pub support_atr_multiple: Option<f64>,
    pub min_adx: Option<f64>,
}

impl EntryRules {
    /// True when no predicate is configured. Such a rule set never enters.
    pub fn is_empty(&self) -> bool {
        self.rsi_min.is_none()
            && self.rsi_max.is_none()
            && self.volume_multiplier.is_none()
            && !self.above_cloud
            && self.max_pullback.is_none()
            && self.consolidation_bars.is_none()
            && self.support_atr_multiple.is_none()
            && self.min_adx.is_none()
    }
}

/// Oscillator-exhaustion exit: RSI below a floor, optionally confirmed by
/// MFI and by price closing under the fast MA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentumExit {
    pub rsi_below: f64,
    #[serde(default)]
    pub mfi_below: Option<f64>,
    #[serde(default)]
    pub below_fast_ma: bool,
}

/// One step of the time-decayed ROI table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoiStep {
    /// Trade age, in candles, from which this step applies.
    pub after_candles: u64,
    /// Profit ratio required to exit (0.01 = +1%).
    pub min_profit: f64,
}

pub fn default_roi() -> Vec<RoiStep> {
    [(0, 0.02), (30, 0.015), (60, 0.01), (120, 0.005)]
        .into_iter()
        .map(|(after_candles, min_profit)| RoiStep {
            after_candles,
            min_profit,
        })
        .collect()
}

/// Exit rules evaluated against an open position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExitRules {
    /// Exit once profit reaches this ratio.
    pub profit_target: Option<f64>,
    /// Exit once price reaches resistance × (1 - margin).
    pub resistance_margin: Option<f64>,
    pub momentum: Option<MomentumExit>,
    /// Exit when the conversion line drops below the base line.
    pub exit_on_cloud_cross: bool,
    /// An empty table disables the ROI exit.
    pub roi: Vec<RoiStep>,
}

impl Default for ExitRules {
    fn default() -> Self {
        Self {
            profit_target: None,
            resistance_margin: None,
            momentum: None,
            exit_on_cloud_cross: false,
            roi: default_roi(),
        }
    }
}

/// Protective stop configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum StopParams {
    /// Baseline at open × (1 + initial_stop); trails price once profit
    /// exceeds `trailing_activation`.
    Percent {
        initial_stop: f64,
        #[serde(default)]
        trailing_activation: Option<f64>,
        #[serde(default)]
        trailing_distance: Option<f64>,
    },
    /// Stop and take-profit at fixed ATR multiples from the open price, with
    /// ATR frozen at the candle the trade opened on.
    Atr {
        stop_multiple: f64,
        #[serde(default)]
        target_multiple: Option<f64>,
    },
}

impl StopParams {
    pub fn percent(initial_stop: f64) -> Self {
        StopParams::Percent {
            initial_stop,
            trailing_activation: None,
            trailing_distance: None,
        }
    }

    pub fn trailing(initial_stop: f64, activation: f64, distance: f64) -> Self {
        StopParams::Percent {
            initial_stop,
            trailing_activation: Some(activation),
            trailing_distance: Some(distance),
        }
    }
}

impl Default for StopParams {
    fn default() -> Self {
        StopParams::percent(-0.05)
    }
}

/// Everything a regime needs to produce entry, exit and stop decisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterSet {
    pub entry: EntryRules,
    pub exit: ExitRules,
    pub stop: StopParams,
    /// Forced exit once the trade is this many candles old.
    pub max_hold_period: Option<u64>,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            entry: EntryRules::default(),
            exit: ExitRules::default(),
            stop: StopParams::default(),
            max_hold_period: Some(240),
        }
    }
}

impl ParameterSet {
    /// Trend-following pullback entries above the cloud, trailing stop.
    pub fn bull() -> Self {
        Self {
            entry: EntryRules {
                rsi_min: Some(40.0),
                rsi_max: Some(75.0),
                volume_multiplier: Some(1.8),
                above_cloud: true,
                max_pullback: Some(-0.03),
                ..EntryRules::default()
            },
            exit: ExitRules {
                profit_target: Some(0.03),
                resistance_margin: Some(0.005),
                ..ExitRules::default()
            },
            stop: StopParams::trailing(-0.04, 0.015, 0.02),
            max_hold_period: Some(240),
        }
    }

    /// Range breakouts out of consolidation near support, tight trailing stop.
    pub fn choppy() -> Self {
        Self {
            entry: EntryRules {
                rsi_min: Some(45.0),
                rsi_max: Some(65.0),
                volume_multiplier: Some(2.5),
                consolidation_bars: Some(14),
                support_atr_multiple: Some(1.0),
                ..EntryRules::default()
            },
            exit: ExitRules {
                profit_target: Some(0.015),
                resistance_margin: Some(0.005),
                ..ExitRules::default()
            },
            stop: StopParams::trailing(-0.03, 0.008, 0.01),
            max_hold_period: Some(240),
        }
    }

    /// Defensive support bounces with a wide fixed stop.
    pub fn bear() -> Self {
        Self {
            entry: EntryRules {
                rsi_min: Some(38.0),
                volume_multiplier: Some(2.2),
                consolidation_bars: Some(12),
                support_atr_multiple: Some(1.5),
                ..EntryRules::default()
            },
            exit: ExitRules {
                profit_target: Some(0.015),
                resistance_margin: Some(0.005),
                ..ExitRules::default()
            },
            stop: StopParams::percent(-0.05),
            max_hold_period: Some(240),
        }
    }

    pub fn neutral() -> Self {
        Self::bear()
    }

    /// Range and ordering checks. `regime` only labels the error.
    pub fn validate(&self, regime: Regime) -> Result<(), ConfigError> {
        let at = |field: &str| format!("regimes.{}.{field}", regime.as_str().to_lowercase());
        let e = &self.entry;

        for (name, value) in [("entry.rsi_min", e.rsi_min), ("entry.rsi_max", e.rsi_max)] {
            if let Some(v) = value {
                if !(0.0..=100.0).contains(&v) {
                    return Err(ConfigError::invalid(at(name), v, "must be within [0, 100]"));
                }
            }
        }
        if let (Some(min), Some(max)) = (e.rsi_min, e.rsi_max) {
            if min >= max {
                return Err(ConfigError::InvalidThresholdOrder {
                    name: at("entry.rsi"),
                    low: min,
                    high: max,
                });
            }
        }
        if let Some(v) = e.volume_multiplier {
            positive(at("entry.volume_multiplier"), v)?;
        }
        if let Some(v) = e.support_atr_multiple {
            positive(at("entry.support_atr_multiple"), v)?;
        }
        if let Some(v) = e.max_pullback {
            finite(at("entry.max_pullback"), v)?;
        }
        if let Some(v) = e.min_adx {
            finite(at("entry.min_adx"), v)?;
        }
        if e.consolidation_bars == Some(0) {
            return Err(ConfigError::InvalidPeriod {
                name: at("entry.consolidation_bars"),
            });
        }

        let x = &self.exit;
        if let Some(v) = x.profit_target {
            positive(at("exit.profit_target"), v)?;
        }
        if let Some(v) = x.resistance_margin {
            if !(0.0..1.0).contains(&v) {
                return Err(ConfigError::invalid(at("exit.resistance_margin"), v, "must be within [0, 1)"));
            }
        }
        if let Some(m) = &x.momentum {
            finite(at("exit.momentum.rsi_below"), m.rsi_below)?;
            if let Some(v) = m.mfi_below {
                finite(at("exit.momentum.mfi_below"), v)?;
            }
        }
        for pair in x.roi.windows(2) {
            if pair[1].after_candles <= pair[0].after_candles {
                return Err(ConfigError::InvalidThresholdOrder {
                    name: at("exit.roi.after_candles"),
                    low: pair[0].after_candles as f64,
                    high: pair[1].after_candles as f64,
                });
            }
        }
        for step in &x.roi {
            finite(at("exit.roi.min_profit"), step.min_profit)?;
        }

        match &self.stop {
            StopParams::Percent {
                initial_stop,
                trailing_activation,
                trailing_distance,
            } => {
                if !within_open(*initial_stop, -1.0, 0.0) {
                    return Err(ConfigError::invalid(
                        at("stop.initial_stop"),
                        *initial_stop,
                        "must be within (-1, 0)",
                    ));
                }
                match (trailing_activation, trailing_distance) {
                    (None, None) => {}
                    (Some(activation), Some(distance)) => {
                        if activation.is_nan() || *activation < 0.0 {
                            return Err(ConfigError::invalid(
                                at("stop.trailing_activation"),
                                *activation,
                                "must be >= 0",
                            ));
                        }
                        if !within_open(*distance, 0.0, 1.0) {
                            return Err(ConfigError::invalid(
                                at("stop.trailing_distance"),
                                *distance,
                                "must be within (0, 1)",
                            ));
                        }
                    }
                    (Some(v), None) | (None, Some(v)) => {
                        return Err(ConfigError::invalid(
                            at("stop.trailing"),
                            *v,
                            "trailing_activation and trailing_distance must be set together",
                        ));
                    }
                }
            }
            StopParams::Atr {
                stop_multiple,
                target_multiple,
            } => {
                positive(at("stop.stop_multiple"), *stop_multiple)?;
                if let Some(v) = target_multiple {
                    positive(at("stop.target_multiple"), *v)?;
                }
            }
        }

        if self.max_hold_period == Some(0) {
            return Err(ConfigError::InvalidPeriod {
                name: at("max_hold_period"),
            });
        }
        Ok(())
    }
}

fn within_open(value: f64, low: f64, high: f64) -> bool {
    value > low && value < high
}

fn positive(name: String, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(name, value, "must be positive"))
    }
}

fn finite(name: String, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(name, value, "must be finite"))
    }
}

/// Parameter sets as written in config. A missing entry is a config error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeTable {
    pub bull: Option<ParameterSet>,
    pub bear: Option<ParameterSet>,
    pub choppy: Option<ParameterSet>,
    pub neutral: Option<ParameterSet>,
}

impl Default for RegimeTable {
    fn default() -> Self {
        Self {
            bull: Some(ParameterSet::bull()),
            bear: Some(ParameterSet::bear()),
            choppy: Some(ParameterSet::choppy()),
            neutral: Some(ParameterSet::neutral()),
        }
    }
}

impl RegimeTable {
    pub fn get(&self, regime: Regime) -> Option<&ParameterSet> {
        match regime {
            Regime::Bull => self.bull.as_ref(),
            Regime::Bear => self.bear.as_ref(),
            Regime::Choppy => self.choppy.as_ref(),
            Regime::Neutral => self.neutral.as_ref(),
        }
    }

    pub fn get_mut(&mut self, regime: Regime) -> &mut Option<ParameterSet> {
        match regime {
            Regime::Bull => &mut self.bull,
            Regime::Bear => &mut self.bear,
            Regime::Choppy => &mut self.choppy,
            Regime::Neutral => &mut self.neutral,
        }
    }
}

/// Total regime → `ParameterSet` lookup.
#[derive(Debug, Clone)]
pub struct RuleTable {
    sets: [ParameterSet; 4],
}

impl RuleTable {
    pub fn from_config(table: &RegimeTable) -> Result<Self, ConfigError> {
        let take = |regime: Regime| -> Result<ParameterSet, ConfigError> {
            let set = table
                .get(regime)
                .ok_or(ConfigError::MissingParameterSet(regime))?;
            set.validate(regime)?;
            Ok(set.clone())
        };
        // Order must match `Regime::index`.
        Ok(Self {
            sets: [
                take(Regime::Bull)?,
                take(Regime::Bear)?,
                take(Regime::Choppy)?,
                take(Regime::Neutral)?,
            ],
        })
    }

    pub fn select(&self, regime: Regime) -> &ParameterSet {
        &self.sets[regime.index()]
    }
}
