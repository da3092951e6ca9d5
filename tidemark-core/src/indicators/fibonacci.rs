//! Fibonacci retracement levels between an observed low and high.

use crate::domain::round2;

/// The conventional retracement ratios, top down.
pub const RATIOS: [(&str, f64); 6] = [
    ("0.0%", 0.0),
    ("23.6%", 0.236),
    ("38.2%", 0.382),
    ("50.0%", 0.5),
    ("61.8%", 0.618),
    ("100.0%", 1.0),
];

/// Retracement levels from `price_max` down to `price_min`.
pub fn retracements(price_min: f64, price_max: f64) -> Vec<(&'static str, f64)> {
    let diff = price_max - price_min;
    RATIOS
        .iter()
        .map(|&(label, ratio)| (label, round2(price_max - ratio * diff)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_match_extremes() {
        let levels = retracements(50.0, 100.0);
        assert_eq!(levels[0], ("0.0%", 100.0));
        assert_eq!(levels[5], ("100.0%", 50.0));
    }

    #[test]
    fn levels_descend() {
        let levels = retracements(80.0, 120.0);
        for pair in levels.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
    }

    #[test]
    fn golden_ratio_level() {
        let levels = retracements(0.0, 100.0);
        assert_eq!(levels[4], ("61.8%", 38.2));
    }
}
