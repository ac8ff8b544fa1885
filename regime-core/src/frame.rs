//! Indicator pipeline and the immutable frame it produces.
//!
//! The pipeline turns one `CandleSeries` (plus an optional benchmark series)
//! into an `IndicatorFrame`: one column per derived series, aligned 1:1 with
//! the candles. The frame is built fresh every evaluation cycle and never
//! mutated afterwards. Undefined entries are stored as NaN and surfaced as
//! `None` by every accessor.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::CandleSeries;
use crate::indicators::ema::ema_of_series;
use crate::indicators::extrema::{RollingHigh, RollingLow};
use crate::indicators::ratio::{below_fraction, pct_change, ratio_series, spread_fraction};
use crate::indicators::rsi::rsi_of_series;
use crate::indicators::sma::sma_of_series;
use crate::indicators::{
    align_benchmark_closes, heikin_ashi_close, Adx, Atr, Cloud, CloudParams, Indicator, Mfi,
};

/// Named columns of an `IndicatorFrame`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    /// Raw candle close.
    Close,
    /// Decision price: close, or Heikin-Ashi close.
    Price,
    MaFast,
    MaSlow,
    /// |fast - slow| / close.
    MaSpread,
    Rsi,
    Mfi,
    Adx,
    Atr,
    /// ATR / close.
    AtrPct,
    VolumeMa,
    /// volume / VolumeMa.
    VolumeRatio,
    Support,
    Resistance,
    /// 1.0 when the candle range is below the consolidation threshold.
    Consolidating,
    /// Percentage change of Price over the pullback period.
    Pullback,
    Tenkan,
    Kijun,
    SenkouA,
    SenkouB,
    /// Price / forward-filled benchmark close.
    RelativeStrength,
}

impl Column {
    pub const ALL: [Column; 21] = [
        Column::Close,
        Column::Price,
        Column::MaFast,
        Column::MaSlow,
        Column::MaSpread,
        Column::Rsi,
        Column::Mfi,
        Column::Adx,
        Column::Atr,
        Column::AtrPct,
        Column::VolumeMa,
        Column::VolumeRatio,
        Column::Support,
        Column::Resistance,
        Column::Consolidating,
        Column::Pullback,
        Column::Tenkan,
        Column::Kijun,
        Column::SenkouA,
        Column::SenkouB,
        Column::RelativeStrength,
    ];
}

/// Moving-average flavour for the fast/slow pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaKind {
    Ema,
    Sma,
}

/// Periods and switches for the indicator battery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub ma_kind: MaKind,
    pub ma_fast: usize,
    pub ma_slow: usize,
    pub rsi_period: usize,
    pub mfi_period: usize,
    pub adx_period: usize,
    pub atr_period: usize,
    pub volume_period: usize,
    /// Window of the support / resistance extrema.
    pub extrema_period: usize,
    /// Window of the average candle range used by the consolidation flag.
    pub range_period: usize,
    pub consolidation_factor: f64,
    pub pullback_period: usize,
    /// Use the Heikin-Ashi close as the decision price.
    pub heikin_ashi: bool,
    pub cloud: CloudParams,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            ma_kind: MaKind::Ema,
            ma_fast: 25,
            ma_slow: 100,
            rsi_period: 14,
            mfi_period: 14,
            adx_period: 14,
            atr_period: 14,
            volume_period: 20,
            extrema_period: 20,
            range_period: 20,
            consolidation_factor: 0.7,
            pullback_period: 8,
            heikin_ashi: false,
            cloud: CloudParams::default(),
        }
    }
}

impl IndicatorConfig {
    /// Leading undefined indices of each column family, by name.
    pub fn lookbacks(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("ma_fast", self.ma_fast.saturating_sub(1)),
            ("ma_slow", self.ma_slow.saturating_sub(1)),
            ("rsi", self.rsi_period),
            ("mfi", self.mfi_period),
            ("adx", (2 * self.adx_period).saturating_sub(1)),
            ("atr", self.atr_period),
            ("volume", self.volume_period.saturating_sub(1)),
            ("extrema", self.extrema_period.saturating_sub(1)),
            ("consolidation", self.range_period.saturating_sub(1)),
            ("pullback", self.pullback_period),
            ("cloud", self.cloud.lookback()),
        ]
    }

    /// Candles required before every column is defined at the latest index.
    pub fn warmup(&self) -> usize {
        self.lookbacks()
            .into_iter()
            .map(|(_, lb)| lb)
            .max()
            .unwrap_or(0)
            + 1
    }
}

/// Derived series aligned with a candle series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorFrame {
    len: usize,
    warmup: usize,
    columns: HashMap<Column, Vec<f64>>,
}

impl IndicatorFrame {
    pub(crate) fn new(len: usize, warmup: usize) -> Self {
        Self {
            len,
            warmup,
            columns: HashMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, column: Column, values: Vec<f64>) {
        debug_assert_eq!(values.len(), self.len, "column {column:?} misaligned");
        self.columns.insert(column, values);
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Candles required before the latest row is fully defined.
    pub fn warmup(&self) -> usize {
        self.warmup
    }

    /// Defined value at `index`; `None` if missing, out of range or undefined.
    pub fn value(&self, column: Column, index: usize) -> Option<f64> {
        self.columns
            .get(&column)
            .and_then(|v| v.get(index).copied())
            .filter(|v| v.is_finite())
    }

    /// Raw series, NaN marking undefined entries.
    pub fn series(&self, column: Column) -> Option<&[f64]> {
        self.columns.get(&column).map(|v| v.as_slice())
    }

    pub fn row(&self, index: usize) -> Option<FrameRow<'_>> {
        (index < self.len).then_some(FrameRow { frame: self, index })
    }

    pub fn latest(&self) -> Option<FrameRow<'_>> {
        self.len.checked_sub(1).and_then(|i| self.row(i))
    }
}

/// Borrowed view of one index of a frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameRow<'a> {
    frame: &'a IndicatorFrame,
    index: usize,
}

impl<'a> FrameRow<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn get(&self, column: Column) -> Option<f64> {
        self.frame.value(column, self.index)
    }

    /// True once the series has at least `warmup` candles up to this row.
    pub fn is_warm(&self) -> bool {
        self.index + 1 >= self.frame.warmup
    }

    /// The row `n` candles earlier.
    pub fn back(&self, n: usize) -> Option<FrameRow<'a>> {
        self.index.checked_sub(n).and_then(|i| self.frame.row(i))
    }
}

/// Computes an `IndicatorFrame` from candles.
#[derive(Debug, Clone)]
pub struct IndicatorPipeline {
    config: IndicatorConfig,
}

impl IndicatorPipeline {
    pub fn new(config: IndicatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IndicatorConfig {
        &self.config
    }

    pub fn warmup(&self) -> usize {
        self.config.warmup()
    }

    /// Build the frame for `series`.
    ///
    /// `benchmark` feeds the relative-strength column only; `max_benchmark_age`
    /// marks forward-filled benchmark values older than that as undefined.
    pub fn compute(
        &self,
        series: &CandleSeries,
        benchmark: Option<&CandleSeries>,
        max_benchmark_age: Option<Duration>,
    ) -> IndicatorFrame {
        let cfg = &self.config;
        let candles = series.candles();
        let n = candles.len();
        let mut frame = IndicatorFrame::new(n, self.warmup());
        if n == 0 {
            return frame;
        }

        let close: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let price = if cfg.heikin_ashi {
            heikin_ashi_close(candles)
        } else {
            close.clone()
        };
        let volume: Vec<f64> = candles.iter().map(|c| c.volume).collect();

        let (ma_fast, ma_slow) = match cfg.ma_kind {
            MaKind::Ema => (
                ema_of_series(&close, cfg.ma_fast),
                ema_of_series(&close, cfg.ma_slow),
            ),
            MaKind::Sma => (
                sma_of_series(&close, cfg.ma_fast),
                sma_of_series(&close, cfg.ma_slow),
            ),
        };
        let atr = Atr::new(cfg.atr_period).compute(candles);
        let volume_ma = sma_of_series(&volume, cfg.volume_period);
        let range: Vec<f64> = candles.iter().map(|c| c.high - c.low).collect();
        let avg_range = sma_of_series(&range, cfg.range_period);
        let cloud = Cloud::compute(candles, &cfg.cloud);

        let relative = match benchmark {
            Some(bench) if !bench.is_empty() => {
                let aligned = align_benchmark_closes(candles, bench.candles(), max_benchmark_age);
                ratio_series(&price, &aligned)
            }
            _ => vec![f64::NAN; n],
        };

        frame.insert(Column::MaSpread, spread_fraction(&ma_fast, &ma_slow, &close));
        frame.insert(Column::AtrPct, ratio_series(&atr, &close));
        frame.insert(Column::VolumeRatio, ratio_series(&volume, &volume_ma));
        frame.insert(
            Column::Consolidating,
            below_fraction(&range, &avg_range, cfg.consolidation_factor),
        );
        frame.insert(Column::Pullback, pct_change(&price, cfg.pullback_period));
        frame.insert(Column::Rsi, rsi_of_series(&price, cfg.rsi_period));
        frame.insert(Column::Mfi, Mfi::new(cfg.mfi_period).compute(candles));
        frame.insert(Column::Adx, Adx::new(cfg.adx_period).compute(candles));
        frame.insert(Column::Support, RollingLow::new(cfg.extrema_period).compute(candles));
        frame.insert(
            Column::Resistance,
            RollingHigh::new(cfg.extrema_period).compute(candles),
        );
        frame.insert(Column::Tenkan, cloud.tenkan);
        frame.insert(Column::Kijun, cloud.kijun);
        frame.insert(Column::SenkouA, cloud.senkou_a);
        frame.insert(Column::SenkouB, cloud.senkou_b);
        frame.insert(Column::RelativeStrength, relative);
        frame.insert(Column::MaFast, ma_fast);
        frame.insert(Column::MaSlow, ma_slow);
        frame.insert(Column::Atr, atr);
        frame.insert(Column::VolumeMa, volume_ma);
        frame.insert(Column::Price, price);
        frame.insert(Column::Close, close);

        tracing::trace!(
            pair = series.pair(),
            candles = n,
            warmup = frame.warmup(),
            "indicator frame computed"
        );
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CandleSeries, Timeframe};
    use crate::indicators::make_candles;

    fn small_config() -> IndicatorConfig {
        IndicatorConfig {
            ma_fast: 3,
            ma_slow: 5,
            rsi_period: 3,
            mfi_period: 3,
            adx_period: 3,
            atr_period: 3,
            volume_period: 3,
            extrema_period: 3,
            range_period: 3,
            pullback_period: 2,
            heikin_ashi: false,
            cloud: CloudParams {
                conversion: 2,
                base: 3,
                span_b: 4,
                displacement: 2,
            },
            ..IndicatorConfig::default()
        }
    }

    fn series(closes: &[f64]) -> CandleSeries {
        CandleSeries::from_candles("ETH/USDT", Timeframe::minutes(5), make_candles(closes))
            .unwrap()
    }

    #[test]
    fn default_warmup_is_cloud_bound() {
        // span_b 120 + displacement 30 dominates the slow EMA (100)
        assert_eq!(IndicatorConfig::default().warmup(), 150);
    }

    #[test]
    fn every_column_is_aligned() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let frame = IndicatorPipeline::new(small_config()).compute(&series(&closes), None, None);
        assert_eq!(frame.len(), 30);
        for col in Column::ALL {
            assert_eq!(frame.series(col).unwrap().len(), 30, "{col:?}");
        }
    }

    #[test]
    fn latest_row_defined_after_warmup() {
        let cfg = small_config();
        let warmup = cfg.warmup();
        let closes: Vec<f64> = (0..warmup).map(|i| 100.0 + (i as f64 * 0.7).sin()).collect();
        let frame = IndicatorPipeline::new(cfg).compute(&series(&closes), None, None);
        let row = frame.latest().unwrap();
        assert!(row.is_warm());
        for col in Column::ALL {
            if col == Column::RelativeStrength {
                continue;
            }
            assert!(row.get(col).is_some(), "{col:?} undefined after warmup");
        }
    }

    #[test]
    fn short_series_rows_are_not_warm() {
        let frame = IndicatorPipeline::new(small_config()).compute(&series(&[1.0, 2.0]), None, None);
        let row = frame.latest().unwrap();
        assert!(!row.is_warm());
        assert!(row.get(Column::MaSlow).is_none());
        assert!(row.get(Column::Close).is_some());
    }

    #[test]
    fn empty_series_gives_empty_frame() {
        let frame = IndicatorPipeline::new(small_config()).compute(&series(&[]), None, None);
        assert!(frame.is_empty());
        assert!(frame.latest().is_none());
    }

    #[test]
    fn relative_strength_uses_benchmark() {
        let pair = series(&[10.0, 20.0, 30.0]);
        let bench = series(&[5.0, 5.0, 10.0]);
        let frame = IndicatorPipeline::new(small_config()).compute(&pair, Some(&bench), None);
        assert_eq!(frame.value(Column::RelativeStrength, 0), Some(2.0));
        assert_eq!(frame.value(Column::RelativeStrength, 2), Some(3.0));
    }

    #[test]
    fn relative_strength_undefined_without_benchmark() {
        let frame = IndicatorPipeline::new(small_config()).compute(&series(&[10.0, 20.0]), None, None);
        assert!(frame.value(Column::RelativeStrength, 1).is_none());
    }

    #[test]
    fn value_hides_nan() {
        let mut frame = IndicatorFrame::new(2, 1);
        frame.insert(Column::Rsi, vec![f64::NAN, 55.0]);
        assert_eq!(frame.value(Column::Rsi, 0), None);
        assert_eq!(frame.value(Column::Rsi, 1), Some(55.0));
        assert_eq!(frame.value(Column::Rsi, 2), None);
        assert_eq!(frame.value(Column::Adx, 1), None);
    }

    #[test]
    fn row_back_walks_history() {
        let frame = IndicatorPipeline::new(small_config()).compute(&series(&[1.0, 2.0, 3.0]), None, None);
        let row = frame.latest().unwrap();
        assert_eq!(row.back(2).unwrap().get(Column::Close), Some(1.0));
        assert!(row.back(3).is_none());
    }
}
