//! Candle reversal validators for the simple decision table.
//!
//! A bullish reversal wants a hammer (long lower wick) closing back above
//! the short average with three rising volumes; a bearish reversal wants an
//! upper-wick rejection closing below the average with three falling
//! volumes. Any missing ingredient fails the validation quietly.

use crate::domain::CandleSeries;

const HAMMER_WICK_RATIO: f64 = 1.5;
const REJECTION_WICK_RATIO: f64 = 1.2;

/// Confirmed down-to-up reversal on the latest candle.
pub fn bullish_reversal(series: &CandleSeries, sma20: f64) -> bool {
    let Some(candle) = series.last() else {
        return false;
    };
    if candle.is_void() || !sma20.is_finite() {
        return false;
    }

    let body = (candle.close - candle.open).abs();
    let lower_wick = candle.close.min(candle.open) - candle.low;

    let hammer = lower_wick > body * HAMMER_WICK_RATIO;
    let above_average = candle.close > sma20;

    hammer && above_average && volume_run(series, true)
}

/// Confirmed up-to-down reversal on the latest candle.
pub fn bearish_reversal(series: &CandleSeries, sma20: f64) -> bool {
    let Some(candle) = series.last() else {
        return false;
    };
    if candle.is_void() || !sma20.is_finite() {
        return false;
    }

    let body = (candle.close - candle.open).abs();
    let upper_wick = candle.high - candle.close.max(candle.open);

    let rejection = upper_wick > body * REJECTION_WICK_RATIO;
    let below_average = candle.close < sma20;

    rejection && below_average && volume_run(series, false)
}

/// Three strictly rising (or falling) volumes at the tail. Requires more
/// than three candles with volume present.
fn volume_run(series: &CandleSeries, rising: bool) -> bool {
    let candles = series.candles();
    if candles.len() <= 3 {
        return false;
    }
    let tail = &candles[candles.len() - 3..];
    let volumes: Vec<f64> = tail.iter().filter_map(|c| c.volume).collect();
    if volumes.len() < 3 {
        return false;
    }
    if rising {
        volumes[0] < volumes[1] && volumes[1] < volumes[2]
    } else {
        volumes[0] > volumes[1] && volumes[1] > volumes[2]
    }
}
