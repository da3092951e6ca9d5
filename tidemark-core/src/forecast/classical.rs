//! Classical forecaster adapter.
//!
//! Wraps the decomposable trend/seasonality model: resolves the forecast
//! grid, regularizes and trims the series, fits with either a fixed or a
//! grid-searched changepoint flexibility, then anchors the raw forecast to
//! realized volatility (80/20 blend with the short average, clip to the
//! volatility bands). Internal model failures never escape — they become
//! typed `Insufficient` results.

use crate::domain::{
    round2, trajectory::bias_from_endpoints, CandleSeries, ForecastPoint, Timeframe, Trajectory,
};
use crate::indicators::SnapshotRow;

use super::frequency::{regularize, FrequencyPlan};
use super::outliers::trim_zscore;
use super::trend_model::{FitSeries, SeasonalLogistic, TrendModel};
use super::ForecastError;

/// Outcome of an adaptive flexibility search.
#[derive(Debug, Clone, serde::Serialize)]
pub struct FitReport {
    pub best_flexibility: f64,
    /// (candidate, in-sample MAE) for every candidate that fitted.
    pub candidate_mae: Vec<(f64, f64)>,
}

#[derive(Debug, Clone)]
pub struct ClassicalForecaster {
    zscore_cutoff: f64,
    changepoint_grid: Vec<f64>,
    /// Weight of the short average in the post-fit blend (forecast keeps
    /// 1 - sma_blend of its own value).
    sma_blend: f64,
}

impl ClassicalForecaster {
    pub fn new(zscore_cutoff: f64, changepoint_grid: Vec<f64>, sma_blend: f64) -> Self {
        assert!(
            !changepoint_grid.is_empty(),
            "changepoint grid must not be empty"
        );
        assert!(
            (0.0..=1.0).contains(&sma_blend),
            "sma_blend must be in [0, 1]"
        );
        Self {
            zscore_cutoff,
            changepoint_grid,
            sma_blend,
        }
    }

    /// Fixed-flexibility forecast.
    pub fn forecast(
        &self,
        series: &CandleSeries,
        row: &SnapshotRow,
        horizon_units: usize,
        declared: Option<Timeframe>,
        flexibility: f64,
    ) -> Result<Trajectory, ForecastError> {
        let prepared = self.prepare(series, declared)?;
        let mut model = SeasonalLogistic::new(flexibility, prepared.plan.steps_per_unit);
        self.run(&prepared, row, horizon_units, &mut model)
    }

    /// Adaptive forecast: backtests every flexibility candidate in-sample and
    /// forecasts with the one minimizing mean absolute error.
    pub fn forecast_adaptive(
        &self,
        series: &CandleSeries,
        row: &SnapshotRow,
        horizon_units: usize,
        declared: Option<Timeframe>,
    ) -> Result<(Trajectory, FitReport), ForecastError> {
        let prepared = self.prepare(series, declared)?;
        let fit_series = prepared.fit_series(row);

        let mut candidate_mae = Vec::new();
        for &flexibility in &self.changepoint_grid {
            let mut model = SeasonalLogistic::new(flexibility, prepared.plan.steps_per_unit);
            if model.fit(&fit_series).is_err() {
                continue;
            }
            let Ok(fitted) = model.predict_in_sample() else {
                continue;
            };
            let mae = fitted
                .iter()
                .zip(prepared.points.iter().map(|p| p.1))
                .map(|(f, v)| (f - v).abs())
                .sum::<f64>()
                / fitted.len() as f64;
            candidate_mae.push((flexibility, mae));
        }

        let best_flexibility = candidate_mae
            .iter()
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|&(flexibility, _)| flexibility)
            .ok_or_else(|| {
                ForecastError::insufficient("no viable changepoint flexibility candidate")
            })?;

        let mut model = SeasonalLogistic::new(best_flexibility, prepared.plan.steps_per_unit);
        let trajectory = self.run(&prepared, row, horizon_units, &mut model)?;
        Ok((
            trajectory,
            FitReport {
                best_flexibility,
                candidate_mae,
            },
        ))
    }

    /// Clip every point estimate into the volatility channel. Applying the
    /// clip to already-clipped values is a no-op.
    pub fn clip_to_bands(points: &mut [ForecastPoint], lower: f64, upper: f64) {
        for p in points {
            p.value = p.value.clamp(lower, upper);
        }
    }

    fn prepare(
        &self,
        series: &CandleSeries,
        declared: Option<Timeframe>,
    ) -> Result<Prepared, ForecastError> {
        let plan = FrequencyPlan::resolve(declared, series);

        let observed: Vec<_> = series
            .candles()
            .iter()
            .filter(|c| c.close.is_finite())
            .map(|c| (c.ts, c.close))
            .collect();
        let gridded = regularize(&observed, plan.step);
        let trimmed = trim_zscore(gridded, self.zscore_cutoff);

        if trimmed.points.len() < 2 {
            return Err(ForecastError::insufficient(format!(
                "{} points after preparation, need 2",
                trimmed.points.len()
            )));
        }

        let mut warnings = Vec::new();
        if let Some(w) = trimmed.warning {
            warnings.push(w);
        }
        Ok(Prepared {
            plan,
            points: trimmed.points,
            warnings,
        })
    }

    fn run(
        &self,
        prepared: &Prepared,
        row: &SnapshotRow,
        horizon_units: usize,
        model: &mut dyn TrendModel,
    ) -> Result<Trajectory, ForecastError> {
        let fit_series = prepared.fit_series(row);

        model
            .fit(&fit_series)
            .map_err(|e| ForecastError::insufficient(e.to_string()))?;
        let mut points = model
            .predict(prepared.plan.horizon_steps(horizon_units), prepared.plan.step)
            .map_err(|e| ForecastError::insufficient(e.to_string()))?;
        if points.is_empty() {
            return Err(ForecastError::insufficient("model produced no forecast"));
        }

        // Anchor to realized volatility: blend toward the short average,
        // then clip into the band channel.
        let clip_lower = fit_series.floor;
        let clip_upper = fit_series.cap;
        for p in &mut points {
            p.value = p.value * (1.0 - self.sma_blend) + row.sma20 * self.sma_blend;
        }
        Self::clip_to_bands(&mut points, clip_lower, clip_upper);

        let bias = bias_from_endpoints(
            points[0].value,
            points[points.len() - 1].value,
            row.sma20,
        );
        for p in &mut points {
            p.value = round2(p.value);
            p.lower = p.lower.map(round2);
            p.upper = p.upper.map(round2);
        }

        Ok(Trajectory {
            points,
            bias,
            warnings: prepared.warnings.clone(),
        })
    }
}

struct Prepared {
    plan: FrequencyPlan,
    points: Vec<(chrono::NaiveDateTime, f64)>,
    warnings: Vec<String>,
}

impl Prepared {
    /// Growth bounds come from the volatility channel: cap at the upper
    /// band, floor at zero (the lower band can go negative on wide swings).
    fn fit_series(&self, row: &SnapshotRow) -> FitSeries<'_> {
        FitSeries {
            points: &self.points,
            cap: row.sma20 + 2.0 * row.std20,
            floor: (row.sma20 - 2.0 * row.std20).max(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TrendBias;
    use crate::indicators::{make_candles, IndicatorSnapshot};

    fn forecaster() -> ClassicalForecaster {
        ClassicalForecaster::new(3.0, vec![0.01, 0.05, 0.1, 0.15], 0.2)
    }

    fn snapshot_row(series: &CandleSeries) -> SnapshotRow {
        IndicatorSnapshot::compute(series, Timeframe::H1)
            .unwrap()
            .last()
    }

    fn wave(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + (i as f64 * 0.4).sin() * 3.0 + i as f64 * 0.05)
            .collect()
    }

    #[test]
    fn forecast_has_expected_length() {
        let series = make_candles(&wave(60));
        let row = snapshot_row(&series);
        let trajectory = forecaster()
            .forecast(&series, &row, 5, Some(Timeframe::H1), 0.05)
            .unwrap();
        // H1 grid: 6 steps per unit.
        assert_eq!(trajectory.len(), 30);
    }

    #[test]
    fn forecast_bounded_by_volatility_channel() {
        let series = make_candles(&wave(60));
        let row = snapshot_row(&series);
        let lower = (row.sma20 - 2.0 * row.std20).max(0.0);
        let upper = row.sma20 + 2.0 * row.std20;

        // Even a deliberately extreme flexibility stays inside the channel.
        for flexibility in [0.01, 0.5, 5.0] {
            let trajectory = forecaster()
                .forecast(&series, &row, 5, Some(Timeframe::H1), flexibility)
                .unwrap();
            for p in &trajectory.points {
                assert!(
                    p.value >= lower - 0.01 && p.value <= upper + 0.01,
                    "point {} outside [{lower}, {upper}]",
                    p.value
                );
            }
        }
    }

    #[test]
    fn clip_is_idempotent() {
        let series = make_candles(&wave(60));
        let row = snapshot_row(&series);
        let trajectory = forecaster()
            .forecast(&series, &row, 5, Some(Timeframe::H1), 0.05)
            .unwrap();

        let mut reclipped = trajectory.points.clone();
        ClassicalForecaster::clip_to_bands(
            &mut reclipped,
            (row.sma20 - 2.0 * row.std20).max(0.0),
            row.sma20 + 2.0 * row.std20,
        );
        for (a, b) in trajectory.points.iter().zip(&reclipped) {
            assert_eq!(a.value, b.value);
        }
    }

    #[test]
    fn adaptive_picks_minimum_mae() {
        let series = make_candles(&wave(80));
        let row = snapshot_row(&series);
        let (_, report) = forecaster()
            .forecast_adaptive(&series, &row, 5, Some(Timeframe::H1))
            .unwrap();

        assert!(!report.candidate_mae.is_empty());
        let best = report
            .candidate_mae
            .iter()
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap();
        assert_eq!(report.best_flexibility, best.0);
    }

    #[test]
    fn too_short_series_is_insufficient() {
        let series = make_candles(&[100.0]);
        let long = make_candles(&wave(60));
        let row = snapshot_row(&long);
        let result = forecaster().forecast(&series, &row, 5, Some(Timeframe::H1), 0.05);
        assert!(matches!(result, Err(ForecastError::Insufficient { .. })));
    }

    #[test]
    fn trending_series_tags_up_bias() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64 * 0.6).collect();
        let series = make_candles(&closes);
        let row = snapshot_row(&series);
        let trajectory = forecaster()
            .forecast(&series, &row, 5, Some(Timeframe::H1), 0.15)
            .unwrap();
        assert_ne!(trajectory.bias, TrendBias::Down);
    }

    #[test]
    fn timestamps_increase_without_gaps() {
        let series = make_candles(&wave(60));
        let row = snapshot_row(&series);
        let trajectory = forecaster()
            .forecast(&series, &row, 2, Some(Timeframe::M30), 0.05)
            .unwrap();
        for pair in trajectory.points.windows(2) {
            assert_eq!(pair[1].ts - pair[0].ts, chrono::Duration::minutes(30));
        }
    }
}
