//! Deterministic synthetic candle series for tests, benches and dry runs.
//!
//! Each series is a geometric walk: a fixed per-candle drift plus uniform
//! noise, wicks at a fixed fraction beyond the body, and volume growing
//! geometrically with optional jitter. The RNG is seeded from the pair name
//! and a caller seed, so the same inputs always give the same candles.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::{Candle, CandleSeries, Timeframe};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesShape {
    pub start_price: f64,
    /// Per-candle return added to every close.
    pub drift: f64,
    /// Max absolute random return per candle. Zero disables noise.
    pub noise: f64,
    /// High/low extension beyond the candle body, as a fraction of price.
    pub wick: f64,
    pub base_volume: f64,
    /// Per-candle volume growth rate.
    pub volume_growth: f64,
    /// Max relative volume jitter. Zero disables it.
    pub volume_noise: f64,
}

impl SeriesShape {
    /// Steady climb with widening participation.
    pub fn uptrend() -> Self {
        Self {
            start_price: 100.0,
            drift: 0.003,
            noise: 0.0,
            wick: 0.005,
            base_volume: 1_000.0,
            volume_growth: 0.01,
            volume_noise: 0.0,
        }
    }

    /// Constant price, narrow range, constant volume.
    pub fn flat() -> Self {
        Self {
            start_price: 100.0,
            drift: 0.0,
            noise: 0.0,
            wick: 0.001,
            base_volume: 1_000.0,
            volume_growth: 0.0,
            volume_noise: 0.0,
        }
    }

    pub fn downtrend() -> Self {
        Self {
            drift: -0.003,
            volume_growth: 0.0,
            ..Self::uptrend()
        }
    }

    /// Driftless noisy walk.
    pub fn random_walk() -> Self {
        Self {
            start_price: 100.0,
            drift: 0.0,
            noise: 0.01,
            wick: 0.003,
            base_volume: 1_000.0,
            volume_growth: 0.0,
            volume_noise: 0.5,
        }
    }
}

fn rng_for(pair: &str, seed: u64) -> StdRng {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&seed.to_le_bytes());
    hasher.update(pair.as_bytes());
    StdRng::from_seed(*hasher.finalize().as_bytes())
}

fn jitter(rng: &mut StdRng, amplitude: f64) -> f64 {
    if amplitude > 0.0 {
        rng.gen_range(-amplitude..amplitude)
    } else {
        0.0
    }
}

/// Generate `len` candles for `pair` starting at `start`.
pub fn generate(
    pair: &str,
    timeframe: Timeframe,
    start: DateTime<Utc>,
    len: usize,
    shape: SeriesShape,
    seed: u64,
) -> CandleSeries {
    let mut rng = rng_for(pair, seed);
    let mut price = shape.start_price;
    let mut volume = shape.base_volume;
    let step = timeframe.duration();
    let mut open_time = start;

    let candles: Vec<Candle> = (0..len)
        .map(|_| {
            let open = price;
            let close = open * (1.0 + shape.drift + jitter(&mut rng, shape.noise));
            let candle = Candle {
                open_time,
                open,
                high: open.max(close) * (1.0 + shape.wick),
                low: open.min(close) * (1.0 - shape.wick),
                close,
                volume: volume * (1.0 + jitter(&mut rng, shape.volume_noise)),
            };
            open_time += step;
            price = close;
            volume *= 1.0 + shape.volume_growth;
            candle
        })
        .collect();

    CandleSeries::from_ordered(pair, timeframe, candles)
}
