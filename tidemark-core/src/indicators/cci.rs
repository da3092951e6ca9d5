//! Channel deviation oscillator (CCI) at the most recent row.

use crate::domain::Candle;

/// CCI over `period`: deviation of the typical price from its window mean,
/// scaled by 0.015 × mean absolute deviation. `None` when fewer than
/// `period` candles exist or the window is degenerate (zero deviation).
pub fn cci(candles: &[Candle], period: usize) -> Option<f64> {
    assert!(period >= 2, "CCI period must be >= 2");
    let n = candles.len();
    if n < period {
        return None;
    }

    let typical: Vec<f64> = candles[n - period..]
        .iter()
        .map(|c| (c.high + c.low + c.close) / 3.0)
        .collect();
    if typical.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let mean = typical.iter().sum::<f64>() / period as f64;
    let mad = typical.iter().map(|v| (v - mean).abs()).sum::<f64>() / period as f64;
    if mad <= 0.0 {
        return None;
    }

    let last = typical[period - 1];
    Some(crate::domain::round2((last - mean) / (0.015 * mad)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_candles;

    #[test]
    fn cci_requires_period() {
        let series = make_candles(&[100.0; 10]);
        assert_eq!(cci(series.candles(), 20), None);
    }

    #[test]
    fn cci_positive_at_window_top() {
        let closes: Vec<f64> = (0..25).map(|i| 100.0 + i as f64).collect();
        let series = make_candles(&closes);
        assert!(cci(series.candles(), 20).unwrap() > 0.0);
    }

    #[test]
    fn cci_negative_at_window_bottom() {
        let closes: Vec<f64> = (0..25).map(|i| 150.0 - i as f64).collect();
        let series = make_candles(&closes);
        assert!(cci(series.candles(), 20).unwrap() < 0.0);
    }

    #[test]
    fn cci_flat_window_is_absent() {
        let series = make_candles(&[100.0; 25]);
        assert_eq!(cci(series.candles(), 20), None);
    }
}
