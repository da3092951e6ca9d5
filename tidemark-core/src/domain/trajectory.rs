//! Forecast trajectories — the common output shape of both forecaster adapters.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One forecast step.
///
/// The classical adapter fills `lower`/`upper` uncertainty bounds; the
/// sequence adapter produces point estimates only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub ts: NaiveDateTime,
    pub value: f64,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl ForecastPoint {
    pub fn point(ts: NaiveDateTime, value: f64) -> Self {
        Self {
            ts,
            value,
            lower: None,
            upper: None,
        }
    }
}

/// Overall directional bias of a trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendBias {
    Up,
    Down,
    Neutral,
}

/// An ordered forecast trajectory on the resolved step grid.
///
/// Invariant: strictly increasing timestamps with no gaps relative to the
/// step size the producing adapter resolved. Data-quality warnings raised
/// during production (outlier trimming kept the full series, etc.) travel
/// with the trajectory rather than being logged out-of-band.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trajectory {
    pub points: Vec<ForecastPoint>,
    pub bias: TrendBias,
    pub warnings: Vec<String>,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Last `n` points (fewer when the trajectory is shorter).
    pub fn tail(&self, n: usize) -> &[ForecastPoint] {
        let start = self.points.len().saturating_sub(n);
        &self.points[start..]
    }

    /// First `n` points (fewer when the trajectory is shorter).
    pub fn head(&self, n: usize) -> &[ForecastPoint] {
        &self.points[..n.min(self.points.len())]
    }

    /// Highest optimistic level across the trajectory: the upper bound where
    /// present, otherwise the point estimate. Used to cap long targets.
    pub fn max_upper(&self) -> Option<f64> {
        self.points
            .iter()
            .map(|p| p.upper.unwrap_or(p.value))
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.max(v))))
    }

    /// Lowest pessimistic level across the trajectory: the lower bound where
    /// present, otherwise the point estimate. Used to floor short targets.
    pub fn min_lower(&self) -> Option<f64> {
        self.points
            .iter()
            .map(|p| p.lower.unwrap_or(p.value))
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.min(v))))
    }
}

/// Classify a first-vs-last move against a threshold of 1% of `reference`.
pub fn bias_from_endpoints(first: f64, last: f64, reference: f64) -> TrendBias {
    let threshold = reference.abs() * 0.01;
    let delta = last - first;
    if delta > threshold {
        TrendBias::Up
    } else if delta < -threshold {
        TrendBias::Down
    } else {
        TrendBias::Neutral
    }
}
