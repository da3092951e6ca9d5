//! Trend-strength oscillator (ADX) at the most recent row.

use crate::domain::Candle;

/// ADX over `period`, evaluated at the last row.
///
/// Classic construction: smoothed directional movement over smoothed true
/// range gives +DI/−DI, their normalized spread gives DX, and the ADX is the
/// `period`-mean of DX. Needs `2 · period + 1` candles; otherwise `None`.
pub fn adx(candles: &[Candle], period: usize) -> Option<f64> {
    assert!(period >= 1, "ADX period must be >= 1");
    let n = candles.len();
    if n < 2 * period + 1 {
        return None;
    }

    let mut tr = vec![0.0; n];
    let mut plus_dm = vec![0.0; n];
    let mut minus_dm = vec![0.0; n];
    for i in 1..n {
        let (curr, prev) = (&candles[i], &candles[i - 1]);
        let hl = curr.high - curr.low;
        let hc = (curr.high - prev.close).abs();
        let lc = (curr.low - prev.close).abs();
        tr[i] = hl.max(hc).max(lc);

        let up = curr.high - prev.high;
        let down = prev.low - curr.low;
        if up > down && up > 0.0 {
            plus_dm[i] = up;
        }
        if down > up && down > 0.0 {
            minus_dm[i] = down;
        }
    }

    // DX per row from rolling sums, then ADX = mean of the last `period` DX.
    let mut dx_sum = 0.0;
    let mut dx_count = 0usize;
    for i in (n - period)..n {
        let window = (i + 1 - period)..=i;
        let tr_sum: f64 = tr[window.clone()].iter().sum();
        let plus_sum: f64 = plus_dm[window.clone()].iter().sum();
        let minus_sum: f64 = minus_dm[window].iter().sum();
        if tr_sum <= 0.0 {
            return None;
        }
        let plus_di = 100.0 * plus_sum / tr_sum;
        let minus_di = 100.0 * minus_sum / tr_sum;
        let di_total = plus_di + minus_di;
        if di_total <= 0.0 {
            return None;
        }
        dx_sum += (plus_di - minus_di).abs() / di_total * 100.0;
        dx_count += 1;
    }

    let value = dx_sum / dx_count as f64;
    value.is_finite().then(|| crate::domain::round2(value))
}
