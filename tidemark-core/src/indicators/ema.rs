//! Exponential moving average.
//!
//! Recursive form with alpha = 2 / (span + 1), seeded with the first finite
//! value. NaN inputs carry the previous smoothed value forward.

/// Exponential average over `span` periods.
pub fn ema(values: &[f64], span: usize) -> Vec<f64> {
    assert!(span >= 1, "EMA span must be >= 1");
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut result = vec![f64::NAN; values.len()];
    let mut state: Option<f64> = None;

    for (i, &v) in values.iter().enumerate() {
        match (state, v.is_nan()) {
            (None, false) => state = Some(v),
            (Some(prev), false) => state = Some(alpha * v + (1.0 - alpha) * prev),
            (_, true) => {}
        }
        if let Some(s) = state {
            result[i] = s;
        }
    }

    result
}
