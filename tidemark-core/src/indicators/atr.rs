//! Average true range — volatility magnitude at the most recent row.

use crate::domain::Candle;

/// True range of candle `i` against the previous close. `None` when any
/// participating price is non-finite (`f64::max` would silently drop NaN).
fn true_range(curr: &Candle, prev: &Candle) -> Option<f64> {
    if !(curr.high.is_finite() && curr.low.is_finite() && prev.close.is_finite()) {
        return None;
    }
    let hl = curr.high - curr.low;
    let hc = (curr.high - prev.close).abs();
    let lc = (curr.low - prev.close).abs();
    Some(hl.max(hc).max(lc))
}

/// ATR over `period` — the mean of the last `period` true ranges.
///
/// Returns `None` when fewer than `period + 1` candles are available or when
/// the window contains non-finite prices. Absent is the only "no ATR" value;
/// callers never see a zero standing in for missing data.
pub fn atr(candles: &[Candle], period: usize) -> Option<f64> {
    assert!(period >= 1, "ATR period must be >= 1");
    if candles.len() < period + 1 {
        return None;
    }

    let start = candles.len() - period;
    let mut sum = 0.0;
    for i in start..candles.len() {
        sum += true_range(&candles[i], &candles[i - 1])?;
    }
    Some(crate::domain::round2(sum / period as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_candles;

    #[test]
    fn atr_requires_period_plus_one() {
        let series = make_candles(&[100.0, 101.0, 102.0]);
        assert_eq!(atr(series.candles(), 3), None);
        assert!(atr(series.candles(), 2).is_some());
    }

    #[test]
    fn atr_constant_range() {
        // make_candles gives high = max(o,c)+1, low = min(o,c)-1, so a flat
        // series has a true range of exactly 2.
        let series = make_candles(&[100.0; 10]);
        assert_eq!(atr(series.candles(), 5), Some(2.0));
    }

    #[test]
    fn atr_none_on_nan_price() {
        let mut series = make_candles(&[100.0, 101.0, 102.0, 103.0]).candles().to_vec();
        series[3].high = f64::NAN;
        assert_eq!(atr(&series, 2), None);
    }
}
