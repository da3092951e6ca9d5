//! Min-max normalizer for the training window.

use serde::{Deserialize, Serialize};

use super::super::ForecastError;

/// Maps observed values into [0, 1] and back.
///
/// A degenerate (constant) series maps to 0.0 and inverts to the constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    min: f64,
    max: f64,
}

impl MinMaxScaler {
    pub fn fit(values: &[f64]) -> Result<Self, ForecastError> {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            return Err(ForecastError::insufficient(
                "no finite values to fit the normalizer",
            ));
        }
        let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
        let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Ok(Self { min, max })
    }

    fn range(&self) -> f64 {
        self.max - self.min
    }

    pub fn transform(&self, value: f64) -> f64 {
        if self.range() <= 0.0 {
            0.0
        } else {
            (value - self.min) / self.range()
        }
    }

    pub fn transform_all(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.transform(v)).collect()
    }

    pub fn inverse(&self, value: f64) -> f64 {
        if self.range() <= 0.0 {
            self.min
        } else {
            value * self.range() + self.min
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    #[test]
    fn round_trip() {
        let scaler = MinMaxScaler::fit(&[10.0, 20.0, 30.0]).unwrap();
        for v in [10.0, 17.5, 30.0] {
            assert_approx(scaler.inverse(scaler.transform(v)), v, 1e-12);
        }
    }

    #[test]
    fn maps_extremes_to_unit_interval() {
        let scaler = MinMaxScaler::fit(&[10.0, 20.0, 30.0]).unwrap();
        assert_approx(scaler.transform(10.0), 0.0, 1e-12);
        assert_approx(scaler.transform(30.0), 1.0, 1e-12);
    }

    #[test]
    fn constant_series_is_degenerate_but_stable() {
        let scaler = MinMaxScaler::fit(&[5.0, 5.0]).unwrap();
        assert_approx(scaler.transform(5.0), 0.0, 1e-12);
        assert_approx(scaler.inverse(0.7), 5.0, 1e-12);
    }

    #[test]
    fn rejects_all_nan() {
        assert!(MinMaxScaler::fit(&[f64::NAN, f64::NAN]).is_err());
    }

    #[test]
    fn serialization_round_trip() {
        let scaler = MinMaxScaler::fit(&[1.0, 9.0]).unwrap();
        let json = serde_json::to_string(&scaler).unwrap();
        let deser: MinMaxScaler = serde_json::from_str(&json).unwrap();
        assert_eq!(scaler, deser);
    }
}
