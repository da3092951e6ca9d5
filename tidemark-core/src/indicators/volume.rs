//! Volume moving average.
//!
//! Missing volume entries (absent or zero at the feed) are skipped, not
//! averaged as zeros. A window with at least one observation produces a
//! value; a window with none produces NaN.

/// Trailing mean of present volumes over `window` rows (minimum one
/// observation per window).
pub fn volume_sma(volumes: &[Option<f64>], window: usize) -> Vec<f64> {
    assert!(window >= 1, "volume SMA window must be >= 1");
    let n = volumes.len();
    let mut result = vec![f64::NAN; n];

    for i in 0..n {
        let start = (i + 1).saturating_sub(window);
        let present: Vec<f64> = volumes[start..=i].iter().flatten().copied().collect();
        if !present.is_empty() {
            result[i] = present.iter().sum::<f64>() / present.len() as f64;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    #[test]
    fn averages_present_values_only() {
        let volumes = [Some(100.0), None, Some(200.0)];
        let result = volume_sma(&volumes, 3);
        assert_approx(result[2], 150.0, 1e-12);
    }

    #[test]
    fn single_observation_counts() {
        let volumes = [None, Some(40.0), None];
        let result = volume_sma(&volumes, 3);
        assert_approx(result[1], 40.0, 1e-12);
        assert_approx(result[2], 40.0, 1e-12);
    }

    #[test]
    fn all_missing_is_nan() {
        let volumes = [None, None, None];
        assert!(volume_sma(&volumes, 3).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn window_slides() {
        let volumes = [Some(10.0), Some(20.0), Some(30.0), Some(40.0)];
        let result = volume_sma(&volumes, 2);
        assert_approx(result[3], 35.0, 1e-12);
    }
}
