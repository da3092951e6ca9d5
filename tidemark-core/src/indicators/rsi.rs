//! Momentum oscillator (RSI).
//!
//! Rolling-mean form: average gains vs average losses over the window, with a
//! small epsilon in the denominator so a loss-free window never divides by
//! zero. Output is bounded to [0, 100]. Lookback: window.

const EPSILON: f64 = 1e-10;

/// Relative strength index over `window` periods.
pub fn rsi(values: &[f64], window: usize) -> Vec<f64> {
    assert!(window >= 1, "RSI window must be >= 1");
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if n < window + 1 {
        return result;
    }

    // Per-step gains and losses (index i holds the change into values[i]).
    let mut gains = vec![f64::NAN; n];
    let mut losses = vec![f64::NAN; n];
    for i in 1..n {
        let change = values[i] - values[i - 1];
        if change.is_nan() {
            continue;
        }
        gains[i] = change.max(0.0);
        losses[i] = (-change).max(0.0);
    }

    for i in window..n {
        let g = &gains[i + 1 - window..=i];
        let l = &losses[i + 1 - window..=i];
        if g.iter().any(|v| v.is_nan()) || l.iter().any(|v| v.is_nan()) {
            continue;
        }
        let avg_gain = g.iter().sum::<f64>() / window as f64;
        let avg_loss = l.iter().sum::<f64>() / window as f64;
        let rs = avg_gain / (avg_loss + EPSILON);
        result[i] = (100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0);
    }

    result
}
