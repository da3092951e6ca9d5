//! Simple moving average.
//!
//! Lookback: window - 1. Any NaN inside the window yields NaN for that row.

/// Trailing simple average over `window` values.
pub fn sma(values: &[f64], window: usize) -> Vec<f64> {
    assert!(window >= 1, "SMA window must be >= 1");
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    for i in (window - 1)..n {
        let slice = &values[i + 1 - window..=i];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        result[i] = slice.iter().sum::<f64>() / window as f64;
    }

    result
}
