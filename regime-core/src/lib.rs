//! Regime Core: indicator pipeline, regime classifier, rule selection,
//! signal evaluation and risk management for a regime-adaptive strategy.
//!
//! - Domain types (candles, series, positions, decisions)
//! - Indicator battery and the per-cycle `IndicatorFrame`
//! - Regime classification with carry-forward on missing data
//! - Per-regime parameter sets selected through a total `RuleTable`
//! - Entry conjunction, exit disjunction, ratcheted protective stops
//! - `RegimeEngine`: per-pair state and the evaluation entry points
//!
//! The engine consumes candles and a read-only position view and produces
//! `Decision`s. It never fetches data or places orders.

pub mod config;
pub mod domain;
pub mod engine;
pub mod frame;
pub mod indicators;
pub mod provider;
pub mod regime;
pub mod risk;
pub mod rules;
pub mod signal;
pub mod synthetic;

pub use config::{ConfigError, EngineConfig, RegimeSource};
pub use domain::{
    Candle, CandleSeries, Decision, ExitReason, PositionState, Regime, RegimeState, Timeframe,
};
pub use engine::{PairState, RegimeEngine};
pub use frame::{Column, IndicatorFrame, IndicatorPipeline};
pub use provider::{CandleProvider, PositionProvider};
