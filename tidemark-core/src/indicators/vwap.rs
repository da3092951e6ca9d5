//! Volume-weighted average price over the supplied window.

use crate::domain::Candle;

/// VWAP across all candles with volume. `None` when no candle carries
/// volume (zero volume is already normalized to absent upstream).
pub fn vwap(candles: &[Candle]) -> Option<f64> {
    let mut weighted = 0.0;
    let mut total_volume = 0.0;
    for c in candles {
        if let Some(v) = c.volume {
            let typical = (c.high + c.low + c.close) / 3.0;
            if !typical.is_finite() {
                continue;
            }
            weighted += typical * v;
            total_volume += v;
        }
    }
    if total_volume <= 0.0 {
        return None;
    }
    Some(crate::domain::round2(weighted / total_volume))
}
