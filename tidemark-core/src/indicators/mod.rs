//! Indicator engine — pure transforms from candle series to derived series.
//!
//! Column indicators (`sma`, `ema`, `rsi`, `macd`, `bollinger`, `volume`)
//! produce full-length series with NaN warmup prefixes and are assembled into
//! an `IndicatorSnapshot` by `snapshot`. Scalar oscillators (`adx`, `cci`,
//! `atr`, `vwap`) evaluate the most recent row only and return `Option<f64>`
//! — absent, not zero, when there is not enough data.

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod cci;
pub mod ema;
pub mod fibonacci;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod snapshot;
pub mod volume;
pub mod vwap;

pub use adx::adx;
pub use atr::atr;
pub use bollinger::{bollinger_bands, rolling_std};
pub use cci::cci;
pub use ema::ema;
pub use fibonacci::retracements;
pub use macd::macd;
pub use rsi::rsi;
pub use sma::sma;
pub use snapshot::{IndicatorError, IndicatorSnapshot, SnapshotRow};
pub use volume::volume_sma;
pub use vwap::vwap;

/// Create synthetic candles from close prices for testing.
///
/// Generates plausible OHLV: open = prev close (or close for the first
/// candle), high = max(open, close) + 1.0, low = min(open, close) - 1.0,
/// volume = 1000 + index.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> crate::domain::CandleSeries {
    use crate::domain::{Candle, CandleSeries};
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let candles: Vec<Candle> = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle {
                ts: base + chrono::Duration::hours(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: Some(1000.0 + i as f64),
            }
        })
        .collect();
    CandleSeries::new(candles).unwrap()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}
