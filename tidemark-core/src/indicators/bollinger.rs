//! Volatility bands.
//!
//! Upper/lower band = SMA(window) ± k · rolling sample stdev(window).

use super::sma::sma;

/// Rolling sample standard deviation (ddof = 1) over `window` values.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    assert!(window >= 2, "rolling stdev window must be >= 2");
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    for i in (window - 1)..n {
        let slice = &values[i + 1 - window..=i];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        let mean = slice.iter().sum::<f64>() / window as f64;
        let var = slice.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (window as f64 - 1.0);
        result[i] = var.sqrt();
    }

    result
}

/// Returns (middle, std, upper, lower) for `window` and band width `k`.
pub fn bollinger_bands(values: &[f64], window: usize, k: f64) -> (Vec<f64>, Vec<f64>, Vec<f64>, Vec<f64>) {
    let middle = sma(values, window);
    let std = rolling_std(values, window);
    let upper: Vec<f64> = middle.iter().zip(&std).map(|(m, s)| m + k * s).collect();
    let lower: Vec<f64> = middle.iter().zip(&std).map(|(m, s)| m - k * s).collect();
    (middle, std, upper, lower)
}
