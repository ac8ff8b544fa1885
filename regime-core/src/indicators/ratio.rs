//! Element-wise ratio helpers shared by the pipeline.
//!
//! Every helper returns NaN (undefined) when an operand is undefined or the
//! denominator is zero; none of them ever produce ±inf.

/// numerator / denominator, undefined on a zero or undefined denominator.
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if !numerator.is_finite() || !denominator.is_finite() || denominator == 0.0 {
        f64::NAN
    } else {
        numerator / denominator
    }
}

/// Element-wise `safe_div`.
pub fn ratio_series(numerator: &[f64], denominator: &[f64]) -> Vec<f64> {
    numerator
        .iter()
        .zip(denominator)
        .map(|(&n, &d)| safe_div(n, d))
        .collect()
}

/// Percentage change over `periods`: x[t] / x[t - periods] - 1.
pub fn pct_change(values: &[f64], periods: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    for i in periods..values.len() {
        out[i] = safe_div(values[i], values[i - periods]) - 1.0;
    }
    out
}

/// |a - b| / price.
pub fn spread_fraction(a: &[f64], b: &[f64], price: &[f64]) -> Vec<f64> {
    a.iter()
        .zip(b)
        .zip(price)
        .map(|((&a, &b), &p)| safe_div((a - b).abs(), p))
        .collect()
}

/// 1.0 when `range[t] < avg_range[t] * factor`, 0.0 otherwise, NaN when undefined.
pub fn below_fraction(range: &[f64], avg_range: &[f64], factor: f64) -> Vec<f64> {
    range
        .iter()
        .zip(avg_range)
        .map(|(&r, &avg)| {
            if !r.is_finite() || !avg.is_finite() {
                f64::NAN
            } else if r < avg * factor {
                1.0
            } else {
                0.0
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_div_guards_zero_and_nan() {
        assert_eq!(safe_div(4.0, 2.0), 2.0);
        assert!(safe_div(1.0, 0.0).is_nan());
        assert!(safe_div(f64::NAN, 1.0).is_nan());
        assert!(safe_div(1.0, f64::NAN).is_nan());
        assert!(safe_div(1.0, f64::INFINITY).is_nan());
    }

    #[test]
    fn pct_change_basic() {
        let out = pct_change(&[100.0, 110.0, 99.0], 1);
        assert!(out[0].is_nan());
        assert!((out[1] - 0.1).abs() < 1e-12);
        assert!((out[2] + 0.1).abs() < 1e-12);
    }

    #[test]
    fn pct_change_zero_base_undefined() {
        let out = pct_change(&[0.0, 1.0], 1);
        assert!(out[1].is_nan());
    }

    #[test]
    fn spread_fraction_is_absolute() {
        let out = spread_fraction(&[99.0], &[101.0], &[100.0]);
        assert!((out[0] - 0.02).abs() < 1e-12);
    }

    #[test]
    fn below_fraction_flags() {
        let out = below_fraction(&[1.0, 3.0, f64::NAN], &[2.0, 2.0, 2.0], 0.7);
        assert_eq!(out[0], 1.0);
        assert_eq!(out[1], 0.0);
        assert!(out[2].is_nan());
    }
}
