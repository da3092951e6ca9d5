//! Frequency resolution and step-grid regularization.
//!
//! Resolution order: a recognized caller-declared timeframe wins, then a
//! timeframe inferred from the observed candle step, then the default grid
//! (six one-hour steps per horizon unit).

use chrono::{Duration, NaiveDateTime};

use crate::domain::{CandleSeries, Timeframe};

/// The resolved forecast grid for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrequencyPlan {
    pub steps_per_unit: usize,
    pub step: Duration,
    /// The timeframe the plan came from, if any (None for the default grid).
    pub source: Option<Timeframe>,
}

impl FrequencyPlan {
    pub fn resolve(declared: Option<Timeframe>, series: &CandleSeries) -> Self {
        if let Some(tf) = declared {
            let (steps_per_unit, step) = tf.forecast_grid();
            return Self {
                steps_per_unit,
                step,
                source: Some(tf),
            };
        }
        if let Some(tf) = series.step().and_then(Timeframe::infer) {
            let (steps_per_unit, step) = tf.forecast_grid();
            return Self {
                steps_per_unit,
                step,
                source: Some(tf),
            };
        }
        let (steps_per_unit, step) = Timeframe::default_grid();
        Self {
            steps_per_unit,
            step,
            source: None,
        }
    }

    /// Total forecast steps for a horizon expressed in grid units.
    pub fn horizon_steps(&self, horizon_units: usize) -> usize {
        self.steps_per_unit * horizon_units
    }
}

/// Regularize observations onto the step grid, forward-filling gaps.
///
/// The grid runs from the first observation to the last in `step`
/// increments; each slot takes the most recent observation at or before it.
pub fn regularize(
    points: &[(NaiveDateTime, f64)],
    step: Duration,
) -> Vec<(NaiveDateTime, f64)> {
    if points.is_empty() || step <= Duration::zero() {
        return points.to_vec();
    }

    let first = points[0].0;
    let last = points[points.len() - 1].0;
    let mut grid = Vec::new();
    let mut cursor = first;
    let mut source = 0usize;
    let mut value = points[0].1;

    while cursor <= last {
        while source + 1 < points.len() && points[source + 1].0 <= cursor {
            source += 1;
            value = points[source].1;
        }
        grid.push((cursor, value));
        cursor += step;
    }

    grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_candles;
    use chrono::NaiveDate;

    fn ts(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn declared_timeframe_wins() {
        let series = make_candles(&[100.0, 101.0, 102.0]); // hourly candles
        let plan = FrequencyPlan::resolve(Some(Timeframe::M15), &series);
        assert_eq!(plan.steps_per_unit, 4);
        assert_eq!(plan.step, Duration::minutes(15));
        assert_eq!(plan.source, Some(Timeframe::M15));
    }

    #[test]
    fn inferred_from_series_step() {
        let series = make_candles(&[100.0, 101.0, 102.0]); // hourly candles
        let plan = FrequencyPlan::resolve(None, &series);
        assert_eq!(plan.source, Some(Timeframe::H1));
        assert_eq!(plan.horizon_steps(5), 30);
    }

    #[test]
    fn unrecognized_step_falls_back_to_default() {
        let base = ts(0, 0);
        let candles: Vec<crate::domain::Candle> = (0..4)
            .map(|i| crate::domain::Candle {
                ts: base + Duration::minutes(7 * i),
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.0,
                volume: None,
            })
            .collect();
        let series = crate::domain::CandleSeries::new(candles).unwrap();
        let plan = FrequencyPlan::resolve(None, &series);
        assert_eq!(plan.source, None);
        assert_eq!(plan.steps_per_unit, 6);
        assert_eq!(plan.step, Duration::hours(1));
    }

    #[test]
    fn regularize_forward_fills_gaps() {
        let points = vec![(ts(0, 0), 1.0), (ts(3, 0), 4.0)];
        let grid = regularize(&points, Duration::hours(1));
        assert_eq!(grid.len(), 4);
        assert_eq!(grid[1], (ts(1, 0), 1.0));
        assert_eq!(grid[2], (ts(2, 0), 1.0));
        assert_eq!(grid[3], (ts(3, 0), 4.0));
    }

    #[test]
    fn regularize_preserves_regular_input() {
        let points = vec![(ts(0, 0), 1.0), (ts(1, 0), 2.0), (ts(2, 0), 3.0)];
        assert_eq!(regularize(&points, Duration::hours(1)), points);
    }

    #[test]
    fn regularize_empty() {
        assert!(regularize(&[], Duration::hours(1)).is_empty());
    }
}
