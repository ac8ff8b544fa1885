//! Benchmark alignment for relative-strength columns.
//!
//! For each pair candle at time t the benchmark close is taken from the last
//! benchmark candle with `open_time <= t` (forward fill). Before the first
//! benchmark candle, or when the last one is older than `max_age`, the value
//! is undefined.

use chrono::Duration;

use crate::domain::Candle;

pub fn align_benchmark_closes(
    candles: &[Candle],
    benchmark: &[Candle],
    max_age: Option<Duration>,
) -> Vec<f64> {
    let mut out = vec![f64::NAN; candles.len()];
    let mut j = 0usize;

    for (i, candle) in candles.iter().enumerate() {
        while j < benchmark.len() && benchmark[j].open_time <= candle.open_time {
            j += 1;
        }
        let Some(source) = j.checked_sub(1).map(|k| &benchmark[k]) else {
            continue;
        };
        if let Some(max_age) = max_age {
            if candle.open_time - source.open_time > max_age {
                continue;
            }
        }
        out[i] = source.close;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_candles;

    #[test]
    fn identical_timestamps_align_one_to_one() {
        let pair = make_candles(&[1.0, 2.0, 3.0]);
        let bench = make_candles(&[10.0, 20.0, 30.0]);
        assert_eq!(align_benchmark_closes(&pair, &bench, None), vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn missing_benchmark_bars_are_forward_filled() {
        let pair = make_candles(&[1.0, 2.0, 3.0, 4.0]);
        let bench_all = make_candles(&[10.0, 20.0, 30.0, 40.0]);
        let bench = vec![bench_all[0], bench_all[2]];
        let out = align_benchmark_closes(&pair, &bench, None);
        assert_eq!(out, vec![10.0, 10.0, 30.0, 30.0]);
    }

    #[test]
    fn before_first_benchmark_is_undefined() {
        let pair = make_candles(&[1.0, 2.0, 3.0]);
        let bench_all = make_candles(&[10.0, 20.0, 30.0]);
        let out = align_benchmark_closes(&pair, &bench_all[1..], None);
        assert!(out[0].is_nan());
        assert_eq!(out[1], 20.0);
    }

    #[test]
    fn stale_benchmark_is_undefined() {
        let pair = make_candles(&[1.0, 2.0, 3.0, 4.0]);
        let bench = make_candles(&[10.0]);
        let out = align_benchmark_closes(&pair, &bench, Some(Duration::minutes(10)));
        assert_eq!(out[0], 10.0);
        assert_eq!(out[2], 10.0);
        assert!(out[3].is_nan());
    }

    #[test]
    fn empty_benchmark_is_all_undefined() {
        let pair = make_candles(&[1.0, 2.0]);
        assert!(align_benchmark_closes(&pair, &[], None).iter().all(|v| v.is_nan()));
    }
}
