//! Trend-confirmation oscillator pair (MACD).
//!
//! MACD line = EMA(12) - EMA(26); signal line = 9-period EMA of the MACD.

use super::ema::ema;

/// Returns (macd_line, signal_line).
pub fn macd(values: &[f64], fast: usize, slow: usize, signal: usize) -> (Vec<f64>, Vec<f64>) {
    assert!(fast < slow, "MACD fast span must be < slow span");
    let fast_ema = ema(values, fast);
    let slow_ema = ema(values, slow);

    let line: Vec<f64> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema(&line, signal);

    (line, signal_line)
}
