//! Time-decayed ROI table lookup.

use crate::rules::RoiStep;

/// Minimum profit required to exit at `age` candles: the step with the
/// greatest `after_candles <= age`. `None` before the first step or for an
/// empty table. Steps must be sorted by `after_candles`.
pub fn roi_threshold(steps: &[RoiStep], age: u64) -> Option<f64> {
    let idx = steps.partition_point(|s| s.after_candles <= age);
    idx.checked_sub(1).map(|i| steps[i].min_profit)
}
