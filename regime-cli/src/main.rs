//! Regime CLI: replay candle files through the engine and manage configs.
//!
//! Commands:
//! - `replay`: feed each pair candle by candle through a `RegimeEngine`,
//!   printing one JSON decision per line on stdout
//! - `check-config`: validate a TOML config and print its fingerprint
//! - `default-config`: print the built-in config as TOML
//!
//! Logs go to stderr and are filtered with `RUST_LOG` (default `warn`).

use anyhow::{bail, Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use serde::Deserialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use regime_core::domain::{Candle, CandleSeries, Decision, PositionState, Timeframe};
use regime_core::synthetic::{generate, SeriesShape};
use regime_core::{EngineConfig, RegimeEngine};

#[derive(Parser)]
#[command(
    name = "regime",
    about = "Regime CLI: regime-adaptive entry/exit signals over candle data"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay candle histories through the engine, one candle at a time.
    Replay {
        /// Path to a TOML config file. Defaults to the built-in config.
        #[arg(long)]
        config: Option<PathBuf>,

        /// CSV candles for the benchmark pair.
        #[arg(long)]
        benchmark: Option<PathBuf>,

        /// Generate synthetic series instead of reading CSV files.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Candles per synthetic series.
        #[arg(long, default_value_t = 500)]
        candles: usize,

        /// Seed for synthetic series.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Only print decisions that signal an entry or an exit.
        #[arg(long, default_value_t = false)]
        signals_only: bool,

        /// Pairs as PAIR=CSV (or bare pair names with --synthetic).
        pairs: Vec<String>,
    },
    /// Validate a TOML config and print its fingerprint.
    CheckConfig {
        /// Path to the TOML config file.
        path: PathBuf,
    },
    /// Print the built-in default config as TOML.
    DefaultConfig,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Replay {
            config,
            benchmark,
            synthetic,
            candles,
            seed,
            signals_only,
            pairs,
        } => run_replay(
            config.as_deref(),
            benchmark.as_deref(),
            synthetic,
            candles,
            seed,
            signals_only,
            &pairs,
        ),
        Commands::CheckConfig { path } => run_check_config(&path),
        Commands::DefaultConfig => {
            let text = EngineConfig::default()
                .to_toml_string()
                .context("failed to serialize default config")?;
            print!("{text}");
            Ok(())
        }
    }
}

// ── Replay ───────────────────────────────────────────────────────────

fn run_replay(
    config_path: Option<&Path>,
    benchmark_path: Option<&Path>,
    synthetic: bool,
    candles: usize,
    seed: u64,
    signals_only: bool,
    pairs: &[String],
) -> Result<()> {
    let config = match config_path {
        Some(path) => EngineConfig::from_path(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let timeframe = config.timeframe;
    let engine = RegimeEngine::new(config).context("invalid config")?;

    let (benchmark, series) = if synthetic {
        if benchmark_path.is_some() {
            bail!("--benchmark and --synthetic are mutually exclusive");
        }
        synthetic_inputs(&engine, pairs, candles, seed)
    } else {
        if pairs.is_empty() {
            bail!("at least one PAIR=CSV argument is required (or use --synthetic)");
        }
        let benchmark = benchmark_path
            .map(|path| load_candles(path, &engine.config().benchmark.pair, timeframe))
            .transpose()?;
        let series = pairs
            .iter()
            .map(|arg| {
                let (pair, path) = parse_pair_arg(arg)?;
                load_candles(Path::new(path), pair, timeframe)
            })
            .collect::<Result<Vec<_>>>()?;
        (benchmark, series)
    };

    tracing::info!(
        pairs = series.len(),
        fingerprint = %engine.config().fingerprint(),
        "replay started"
    );

    let results: Vec<Vec<Decision>> = series
        .par_iter()
        .map(|s| replay_pair(engine.clone(), s, benchmark.as_ref()))
        .collect();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for decisions in &results {
        for d in decisions {
            if signals_only && !d.entry && !d.exit {
                continue;
            }
            serde_json::to_writer(&mut out, d)?;
            writeln!(out)?;
        }
    }
    out.flush()?;

    for (s, decisions) in series.iter().zip(&results) {
        let entries = decisions.iter().filter(|d| d.entry).count();
        let exits = decisions.iter().filter(|d| d.exit).count();
        tracing::info!(pair = s.pair(), candles = s.len(), entries, exits, "replay finished");
    }
    Ok(())
}

/// Replay one pair, acting as a paper execution layer: a position opens at
/// the close of an entry candle and closes at the close of an exit candle.
fn replay_pair(
    mut engine: RegimeEngine,
    series: &CandleSeries,
    benchmark: Option<&CandleSeries>,
) -> Vec<Decision> {
    let pair = series.pair();
    let mut position: Option<PositionState> = None;
    let mut decisions = Vec::with_capacity(series.len());

    let mut view = CandleSeries::new(pair, series.timeframe());

    for candle in series.candles() {
        if let Err(err) = view.push(*candle) {
            tracing::warn!(pair, error = %err, "replay stopped");
            break;
        }
        let decision = engine.evaluate(pair, &view, benchmark, position.as_ref());
        match position {
            Some(_) if decision.exit => position = None,
            None if decision.entry => {
                position = Some(PositionState::open(candle.open_time, candle.close));
            }
            _ => {}
        }
        decisions.push(decision);
    }
    decisions
}

fn synthetic_inputs(
    engine: &RegimeEngine,
    pairs: &[String],
    candles: usize,
    seed: u64,
) -> (Option<CandleSeries>, Vec<CandleSeries>) {
    let config = engine.config();
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap_or_default();
    let shapes = [
        SeriesShape::uptrend(),
        SeriesShape::random_walk(),
        SeriesShape::flat(),
        SeriesShape::downtrend(),
    ];
    let names: Vec<String> = if pairs.is_empty() {
        ["ETH/USDT", "SOL/USDT", "XRP/USDT", "ADA/USDT"]
            .map(String::from)
            .to_vec()
    } else {
        pairs.to_vec()
    };

    let benchmark = generate(
        &config.benchmark.pair,
        config.timeframe,
        start,
        candles,
        SeriesShape {
            start_price: 40_000.0,
            ..SeriesShape::random_walk()
        },
        seed,
    );
    let series = names
        .iter()
        .zip(shapes.iter().cycle())
        .map(|(pair, shape)| generate(pair, config.timeframe, start, candles, *shape, seed))
        .collect();
    (Some(benchmark), series)
}

// ── CSV input ────────────────────────────────────────────────────────

/// One CSV row. `open_time` is Unix milliseconds.
#[derive(Debug, Deserialize)]
struct CsvCandle {
    open_time: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl CsvCandle {
    fn into_candle(self) -> Result<Candle> {
        let open_time = DateTime::<Utc>::from_timestamp_millis(self.open_time)
            .with_context(|| format!("open_time {} out of range", self.open_time))?;
        Ok(Candle {
            open_time,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        })
    }
}

fn parse_candles<R: std::io::Read>(
    reader: R,
    pair: &str,
    timeframe: Timeframe,
) -> Result<CandleSeries> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let candles = rdr
        .deserialize::<CsvCandle>()
        .enumerate()
        .map(|(i, row)| {
            row.with_context(|| format!("row {}", i + 1))?
                .into_candle()
                .with_context(|| format!("row {}", i + 1))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(CandleSeries::from_candles(pair, timeframe, candles)?)
}

fn load_candles(path: &Path, pair: &str, timeframe: Timeframe) -> Result<CandleSeries> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    parse_candles(file, pair, timeframe)
        .with_context(|| format!("failed to read candles from {}", path.display()))
}

/// Split `PAIR=PATH`.
fn parse_pair_arg(arg: &str) -> Result<(&str, &str)> {
    match arg.split_once('=') {
        Some((pair, path)) if !pair.is_empty() && !path.is_empty() => Ok((pair, path)),
        _ => bail!("expected PAIR=CSV, got '{arg}'"),
    }
}

// ── Config ───────────────────────────────────────────────────────────

fn run_check_config(path: &Path) -> Result<()> {
    let config = EngineConfig::from_path(path)
        .with_context(|| format!("invalid config {}", path.display()))?;
    println!("Config OK: {}", path.display());
    println!("Fingerprint: {}", config.fingerprint());
    println!("Timeframe: {}", config.timeframe);
    println!("Warm-up: {} candles", config.indicators.warmup());
    println!(
        "Regime source: {:?} (benchmark {})",
        config.regime_source, config.benchmark.pair
    );
    Ok(())
}
