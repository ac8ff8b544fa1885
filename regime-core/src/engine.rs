//! Regime engine: per-pair state and the evaluation entry points.
//!
//! One `evaluate` call per new candle per pair:
//!
//! 1. compute the pair's indicator frame (and the benchmark's, when the
//!    benchmark drives the regime)
//! 2. classify the regime, or carry the previous one forward
//! 3. select the regime's `ParameterSet`
//! 4. evaluate entry predicates at the latest candle
//! 5. for an open position: propose a stop, ratchet it, evaluate exits
//!
//! Everything except the per-pair `PairState` is recomputed from the inputs,
//! so re-evaluating the same candle yields the same decision.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::config::{ConfigError, EngineConfig, RegimeSource};
use crate::domain::{CandleSeries, Decision, PositionState, RegimeState};
use crate::frame::{Column, IndicatorFrame, IndicatorPipeline};
use crate::provider::{CandleProvider, PositionProvider};
use crate::regime::{Classification, Indeterminate, RegimeClassifier};
use crate::risk::{propose_stop, RatchetState};
use crate::rules::RuleTable;
use crate::signal::{evaluate_entry, evaluate_exits, ExitInputs};

/// Stop bookkeeping for the trade currently open on a pair.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeState {
    /// Open time of the position this state belongs to.
    pub open_time: DateTime<Utc>,
    pub ratchet: RatchetState,
    /// ATR at the opening candle, sampled once and then frozen.
    pub atr_at_open: Option<f64>,
}

impl TradeState {
    fn new(open_time: DateTime<Utc>) -> Self {
        Self {
            open_time,
            ratchet: RatchetState::new(),
            atr_at_open: None,
        }
    }
}

/// Everything the engine remembers about one pair between evaluations.
#[derive(Debug, Clone, PartialEq)]
pub struct PairState {
    pub regime: RegimeState,
    pub trade: Option<TradeState>,
    /// Open time of the latest evaluated candle.
    pub last_evaluated: Option<DateTime<Utc>>,
}

impl PairState {
    fn new(regime: RegimeState) -> Self {
        Self {
            regime,
            trade: None,
            last_evaluated: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegimeEngine {
    config: EngineConfig,
    pipeline: IndicatorPipeline,
    classifier: RegimeClassifier,
    rules: RuleTable,
    pairs: HashMap<String, PairState>,
}

impl RegimeEngine {
    /// Build an engine. Fails if the config does not validate.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let rules = RuleTable::from_config(&config.regimes)?;
        tracing::debug!(fingerprint = %config.fingerprint(), "engine configured");
        Ok(Self {
            pipeline: IndicatorPipeline::new(config.indicators.clone()),
            classifier: RegimeClassifier::new(config.classifier.clone()),
            rules,
            pairs: HashMap::new(),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Candles a pair needs before entries and exits can fire.
    pub fn warmup(&self) -> usize {
        self.pipeline.warmup()
    }

    /// Regime state for `pair`; the initial state if never evaluated.
    pub fn current_regime(&self, pair: &str) -> RegimeState {
        self.pairs
            .get(pair)
            .map(|s| s.regime)
            .unwrap_or_else(|| RegimeState::new(self.config.initial_regime))
    }

    pub fn pair_state(&self, pair: &str) -> Option<&PairState> {
        self.pairs.get(pair)
    }

    /// Drop all remembered state for `pair`.
    pub fn forget(&mut self, pair: &str) -> Option<PairState> {
        self.pairs.remove(pair)
    }

    /// Pull inputs from providers and evaluate `pair`.
    ///
    /// The benchmark is fetched under `benchmark.pair` at the same timeframe;
    /// when `pair` is the benchmark its own series is reused.
    pub fn evaluate_with<C, P>(&mut self, pair: &str, candles: &C, positions: &P) -> Decision
    where
        C: CandleProvider + ?Sized,
        P: PositionProvider + ?Sized,
    {
        let timeframe = self.config.timeframe;
        let Some(series) = candles.candles(pair, timeframe) else {
            tracing::warn!(pair, timeframe = %timeframe, "no candles available");
            return Decision::empty(pair, self.current_regime(pair).label);
        };
        let benchmark_pair = self.config.benchmark.pair.clone();
        let benchmark = if benchmark_pair == pair {
            Some(series.clone())
        } else {
            candles.candles(&benchmark_pair, timeframe)
        };
        let position = positions.open_position(pair);
        self.evaluate(pair, &series, benchmark.as_ref(), position.as_ref())
    }

    /// Evaluate the latest candle of `candles`.
    ///
    /// `benchmark` may extend past the pair's latest candle; only benchmark
    /// candles opened at or before it are used. Never panics.
    pub fn evaluate(
        &mut self,
        pair: &str,
        candles: &CandleSeries,
        benchmark: Option<&CandleSeries>,
        position: Option<&PositionState>,
    ) -> Decision {
        let initial = RegimeState::new(self.config.initial_regime);
        let state = self
            .pairs
            .entry(pair.to_string())
            .or_insert_with(|| PairState::new(initial));

        let Some(last) = candles.last() else {
            tracing::debug!(pair, "empty series");
            return Decision::empty(pair, state.regime.label);
        };
        let now = last.open_time;

        if let Some(prev) = state.last_evaluated {
            if now < prev {
                tracing::warn!(
                    pair,
                    candle = %now,
                    last_evaluated = %prev,
                    "out-of-order evaluation ignored"
                );
                return Decision::empty(pair, state.regime.label);
            }
        }
        state.last_evaluated = Some(now);

        let max_age = self
            .config
            .benchmark
            .max_staleness_bars
            .map(|bars| self.config.timeframe.duration() * bars.min(i32::MAX as u64) as i32);
        let benchmark = benchmark.map(|b| match b.index_at(now) {
            Some(idx) if idx + 1 < b.len() => b.truncated(idx + 1),
            Some(_) => b.clone(),
            None => CandleSeries::new(b.pair(), b.timeframe()),
        });
        let frame = self.pipeline.compute(candles, benchmark.as_ref(), max_age);

        // Regime.
        let classification = match self.config.regime_source {
            RegimeSource::Pair => self.classifier.classify(&frame),
            RegimeSource::Benchmark => match benchmark_source(
                benchmark.as_ref(),
                now,
                &self.config,
            ) {
                Err(reason) => Classification::Indeterminate(reason),
                Ok(bench) => {
                    let bench_frame = self.pipeline.compute(bench, None, None);
                    self.classifier.classify(&bench_frame)
                }
            },
        };
        let previous = state.regime;
        state.regime = classification.apply(previous, now);
        match &classification {
            Classification::Classified(label) if *label != previous.label => {
                tracing::info!(pair, from = %previous.label, to = %label, "regime transition");
            }
            Classification::Indeterminate(
                reason @ (Indeterminate::MissingBenchmark | Indeterminate::StaleBenchmark { .. }),
            ) => {
                tracing::warn!(pair, regime = %previous.label, %reason, "regime carried forward");
            }
            Classification::Indeterminate(reason) => {
                tracing::debug!(pair, regime = %previous.label, %reason, "regime carried forward");
            }
            Classification::Classified(_) => {}
        }
        let regime = state.regime.label;
        let params = self.rules.select(regime);

        let mut decision = Decision::empty(pair, regime);
        decision.evaluated_at = Some(now);

        // Trade bookkeeping follows the position even during warm-up.
        let position = position.filter(|p| p.is_open);
        match position {
            Some(pos) => {
                if state.trade.as_ref().map(|t| t.open_time) != Some(pos.open_time) {
                    state.trade = Some(TradeState::new(pos.open_time));
                }
            }
            None => state.trade = None,
        }

        let Some(row) = frame.latest() else {
            return decision;
        };
        if !row.is_warm() {
            tracing::debug!(pair, candles = frame.len(), warmup = frame.warmup(), "warming up");
            return decision;
        }

        let entry = evaluate_entry(&row, &params.entry, &self.config.common);
        decision.entry = entry.passed();
        tracing::debug!(pair, regime = %regime, predicates = %entry, "entry evaluated");

        if let (Some(pos), Some(trade)) = (position, state.trade.as_mut()) {
            if trade.atr_at_open.is_none() {
                trade.atr_at_open = atr_at(&frame, candles, pos.open_time);
            }
            let close = row.get(Column::Close);
            let proposal = propose_stop(&params.stop, pos, close, trade.atr_at_open);
            decision.stop_level = trade.ratchet.apply(proposal.stop);

            let reasons = evaluate_exits(&ExitInputs {
                row,
                rules: &params.exit,
                position: pos,
                age: pos.age_in_candles(now, self.config.timeframe),
                max_hold_period: params.max_hold_period,
                stop_level: decision.stop_level,
                take_profit: proposal.take_profit,
            });
            decision.add_exit_reasons(reasons);
        }

        if decision.entry {
            tracing::info!(pair, regime = %regime, candle = %now, "entry signal");
        }
        if decision.exit {
            tracing::info!(
                pair,
                regime = %regime,
                candle = %now,
                reasons = ?decision.exit_reasons,
                stop = ?decision.stop_level,
                "exit signal"
            );
        }
        decision
    }
}

/// The benchmark series to classify, or why it cannot be used.
fn benchmark_source<'a>(
    benchmark: Option<&'a CandleSeries>,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> Result<&'a CandleSeries, Indeterminate> {
    let bench = benchmark.ok_or(Indeterminate::MissingBenchmark)?;
    let last = bench.last().ok_or(Indeterminate::MissingBenchmark)?;
    if let Some(max_bars) = config.benchmark.max_staleness_bars {
        let age_bars = config.timeframe.bars_between(last.open_time, now);
        if age_bars > max_bars {
            return Err(Indeterminate::StaleBenchmark { age_bars, max_bars });
        }
    }
    Ok(bench)
}

/// ATR at the candle containing `open_time`.
fn atr_at(frame: &IndicatorFrame, candles: &CandleSeries, open_time: DateTime<Utc>) -> Option<f64> {
    candles
        .index_at(open_time)
        .and_then(|idx| frame.value(Column::Atr, idx))
}
