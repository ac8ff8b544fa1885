//! Engine configuration: one structured, serializable object loaded from TOML.
//!
//! Every section carries `#[serde(default)]`, so a config file only needs the
//! keys it changes. The exception is `[regimes]`: once that table is present,
//! all four regimes must be defined.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::{Regime, Timeframe};
use crate::frame::IndicatorConfig;
use crate::regime::ClassifierConfig;
use crate::rules::{RegimeTable, RuleTable};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no parameter set configured for regime {0}")]
    MissingParameterSet(Regime),

    #[error("{name}: {low} must be below {high}")]
    InvalidThresholdOrder { name: String, low: f64, high: f64 },

    #[error("{name}: period must be >= 1")]
    InvalidPeriod { name: String },

    #[error("{name}: {reason} (got {value})")]
    InvalidValue {
        name: String,
        value: f64,
        reason: &'static str,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    pub(crate) fn invalid(name: impl Into<String>, value: f64, reason: &'static str) -> Self {
        ConfigError::InvalidValue {
            name: name.into(),
            value,
            reason,
        }
    }
}

/// Which series drives regime classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegimeSource {
    /// The benchmark series (market-wide regime).
    #[default]
    Benchmark,
    /// The evaluated pair's own series.
    Pair,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    pub pair: String,
    /// Benchmark data older than this many bars relative to the pair's latest
    /// candle is treated as missing. `None` never expires.
    pub max_staleness_bars: Option<u64>,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            pair: "BTC/USDT".to_string(),
            max_staleness_bars: Some(3),
        }
    }
}

/// Entry predicates applied in every regime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommonRules {
    /// Pair / benchmark ratio must exceed this.
    pub min_relative_strength: Option<f64>,
}

impl Default for CommonRules {
    fn default() -> Self {
        Self {
            min_relative_strength: Some(1.005),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub timeframe: Timeframe,
    /// Regime assumed for a pair before its first successful classification.
    pub initial_regime: Regime,
    pub regime_source: RegimeSource,
    pub benchmark: BenchmarkConfig,
    pub indicators: IndicatorConfig,
    pub classifier: ClassifierConfig,
    pub common: CommonRules,
    pub regimes: RegimeTable,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeframe: Timeframe::default(),
            initial_regime: Regime::Neutral,
            regime_source: RegimeSource::default(),
            benchmark: BenchmarkConfig::default(),
            indicators: IndicatorConfig::default(),
            classifier: ClassifierConfig::default(),
            common: CommonRules::default(),
            regimes: RegimeTable::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Read, parse and validate a TOML config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ind = &self.indicators;
        for (name, period) in [
            ("indicators.ma_fast", ind.ma_fast),
            ("indicators.ma_slow", ind.ma_slow),
            ("indicators.rsi_period", ind.rsi_period),
            ("indicators.mfi_period", ind.mfi_period),
            ("indicators.adx_period", ind.adx_period),
            ("indicators.atr_period", ind.atr_period),
            ("indicators.volume_period", ind.volume_period),
            ("indicators.extrema_period", ind.extrema_period),
            ("indicators.range_period", ind.range_period),
            ("indicators.pullback_period", ind.pullback_period),
            ("indicators.cloud.conversion", ind.cloud.conversion),
            ("indicators.cloud.base", ind.cloud.base),
            ("indicators.cloud.span_b", ind.cloud.span_b),
        ] {
            if period == 0 {
                return Err(ConfigError::InvalidPeriod { name: name.into() });
            }
        }
        if ind.ma_fast >= ind.ma_slow {
            return Err(ConfigError::InvalidThresholdOrder {
                name: "indicators.ma_fast/ma_slow".into(),
                low: ind.ma_fast as f64,
                high: ind.ma_slow as f64,
            });
        }
        if !(ind.consolidation_factor > 0.0 && ind.consolidation_factor.is_finite()) {
            return Err(ConfigError::invalid(
                "indicators.consolidation_factor",
                ind.consolidation_factor,
                "must be positive",
            ));
        }

        let c = &self.classifier;
        if c.adx_range > c.adx_trend {
            return Err(ConfigError::InvalidThresholdOrder {
                name: "classifier.adx_range/adx_trend".into(),
                low: c.adx_range,
                high: c.adx_trend,
            });
        }
        for (name, value) in [
            ("classifier.bull_min_atr_pct", c.bull_min_atr_pct),
            ("classifier.choppy_max_spread", c.choppy_max_spread),
            ("classifier.choppy_max_atr_pct", c.choppy_max_atr_pct),
        ] {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(ConfigError::invalid(name, value, "must be >= 0"));
            }
        }

        if let Some(floor) = self.common.min_relative_strength {
            if !(floor > 0.0 && floor.is_finite()) {
                return Err(ConfigError::invalid(
                    "common.min_relative_strength",
                    floor,
                    "must be positive",
                ));
            }
        }

        RuleTable::from_config(&self.regimes)?;
        Ok(())
    }

    /// BLAKE3 hex digest of the canonical JSON form.
    ///
    /// Two configs with the same fingerprint produce identical decisions for
    /// identical inputs.
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_string(self).expect("EngineConfig must serialize");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::StopParams;

    #[test]
    fn default_config_is_valid() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn partial_toml_overrides_only_named_keys() {
        let config = EngineConfig::from_toml_str(
            r#"
            timeframe = "1h"
            regime_source = "pair"

            [indicators]
            ma_fast = 10

            [classifier]
            adx_trend = 30.0
            "#,
        )
        .unwrap();
        assert_eq!(config.timeframe, Timeframe::minutes(60));
        assert_eq!(config.regime_source, RegimeSource::Pair);
        assert_eq!(config.indicators.ma_fast, 10);
        assert_eq!(config.indicators.ma_slow, 100);
        assert_eq!(config.classifier.adx_trend, 30.0);
        assert_eq!(config.classifier.adx_range, 20.0);
    }

    #[test]
    fn partial_regimes_table_is_missing_sets() {
        let config = EngineConfig::from_toml_str(
            r#"
            [regimes.bull]
            max_hold_period = 100
            [regimes.bull.stop]
            mode = "percent"
            initial_stop = -0.02
            "#,
        )
        .unwrap();
        assert_eq!(
            config.regimes.bull.as_ref().unwrap().stop,
            StopParams::percent(-0.02)
        );
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingParameterSet(Regime::Bear))
        ));
    }

    #[test]
    fn inverted_ma_periods_are_rejected() {
        let mut config = EngineConfig::default();
        config.indicators.ma_fast = 100;
        config.indicators.ma_slow = 25;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidThresholdOrder { .. })
        ));
    }

    #[test]
    fn zero_period_is_rejected() {
        let mut config = EngineConfig::default();
        config.indicators.rsi_period = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("rsi_period"));
    }

    #[test]
    fn inverted_adx_thresholds_are_rejected() {
        let mut config = EngineConfig::default();
        config.classifier.adx_range = 30.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = EngineConfig::from_toml_str("timeframe = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        let err = EngineConfig::from_toml_str("timeframe = \"5x\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = EngineConfig::from_path("/nonexistent/regime.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = EngineConfig::default();
        let mut b = EngineConfig::default();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);

        b.classifier.adx_trend = 26.0;
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn default_config_survives_toml() {
        let config = EngineConfig::default();
        let text = config.to_toml_string().unwrap();
        let back = EngineConfig::from_toml_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
