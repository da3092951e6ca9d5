//! Trend/seasonality model seam.
//!
//! The classical adapter treats "fit a decomposable model and obtain
//! pointwise forecasts with uncertainty bounds" as a capability behind the
//! `TrendModel` trait, so the concrete model can be swapped. The built-in
//! `SeasonalLogistic` decomposes the series into a segmented linear trend
//! (changepoint flexibility controls how far segment slopes may drift from
//! the global slope), multiplicative seasonal factors indexed by grid phase,
//! and logistic growth damping toward a saturation cap on extrapolation.

use chrono::{Duration, NaiveDateTime};
use thiserror::Error;

use crate::domain::ForecastPoint;

/// Internal model failure. Absorbed at the adapter boundary — callers of the
/// adapter only ever see a typed `Insufficient`.
#[derive(Debug, Error)]
#[error("model failure: {0}")]
pub struct ModelError(pub String);

/// Observations plus growth bounds for one fit.
#[derive(Debug, Clone)]
pub struct FitSeries<'a> {
    pub points: &'a [(NaiveDateTime, f64)],
    /// Upper growth asymptote.
    pub cap: f64,
    /// Lower growth bound.
    pub floor: f64,
}

/// A decomposable trend/seasonality model with uncertainty bounds.
pub trait TrendModel {
    fn fit(&mut self, series: &FitSeries) -> Result<(), ModelError>;

    /// Fitted values over the observed points, for in-sample scoring.
    fn predict_in_sample(&self) -> Result<Vec<f64>, ModelError>;

    /// Forecast `horizon` steps past the last observation, spaced by `step`.
    fn predict(&self, horizon: usize, step: Duration) -> Result<Vec<ForecastPoint>, ModelError>;
}

const MAX_SEGMENTS: usize = 8;
const POINTS_PER_SEGMENT: usize = 12;
const INTERVAL_Z: f64 = 1.645; // 90% interval

#[derive(Debug, Clone)]
struct FitState {
    last_ts: NaiveDateTime,
    last_trend: f64,
    last_slope: f64,
    seasonal: Vec<f64>,
    next_phase: usize,
    residual_std: f64,
    in_sample: Vec<f64>,
    n: usize,
    cap: f64,
    floor: f64,
}

/// Built-in `TrendModel` implementation.
#[derive(Debug, Clone)]
pub struct SeasonalLogistic {
    flexibility: f64,
    seasonal_period: usize,
    state: Option<FitState>,
}

impl SeasonalLogistic {
    pub fn new(flexibility: f64, seasonal_period: usize) -> Self {
        Self {
            flexibility,
            seasonal_period: seasonal_period.max(1),
            state: None,
        }
    }
}

fn least_squares_slope(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if n < 2.0 {
        return 0.0;
    }
    let t_mean = (n - 1.0) / 2.0;
    let v_mean = values.iter().sum::<f64>() / n;
    let mut num = 0.0;
    let mut den = 0.0;
    for (i, &v) in values.iter().enumerate() {
        let dt = i as f64 - t_mean;
        num += dt * (v - v_mean);
        den += dt * dt;
    }
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

impl TrendModel for SeasonalLogistic {
    fn fit(&mut self, series: &FitSeries) -> Result<(), ModelError> {
        let values: Vec<f64> = series.points.iter().map(|p| p.1).collect();
        let n = values.len();
        if n < 2 {
            return Err(ModelError(format!("need at least 2 points, have {n}")));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ModelError("non-finite observation".into()));
        }
        if !(series.cap.is_finite() && series.floor.is_finite()) || series.cap <= series.floor {
            return Err(ModelError("degenerate growth bounds".into()));
        }

        // Segmented trend: each segment's slope is shrunk toward the global
        // slope; the flexibility parameter sets how much local drift is
        // admitted.
        let global_slope = least_squares_slope(&values);
        let segments = (n / POINTS_PER_SEGMENT).clamp(1, MAX_SEGMENTS);
        let seg_len = n.div_ceil(segments);
        let admit = self.flexibility / (self.flexibility + 0.05);

        let mut trend = Vec::with_capacity(n);
        let mut level = values[0];
        let mut slope = global_slope;
        for i in 0..n {
            if i > 0 {
                level += slope;
            }
            trend.push(level);
            if (i + 1) % seg_len == 0 && i + 1 < n {
                let seg_end = (i + 1 + seg_len).min(n);
                let local = least_squares_slope(&values[i + 1..seg_end]);
                slope = global_slope + (local - global_slope) * admit;
            }
        }

        // Multiplicative seasonal factors by grid phase, normalized to mean 1.
        let period = self.seasonal_period;
        let mut seasonal = vec![1.0; period];
        if period > 1 {
            let mut sums = vec![0.0; period];
            let mut counts = vec![0usize; period];
            for (i, &v) in values.iter().enumerate() {
                let t = trend[i];
                if t.abs() > f64::EPSILON {
                    sums[i % period] += v / t;
                    counts[i % period] += 1;
                }
            }
            for p in 0..period {
                if counts[p] > 0 {
                    seasonal[p] = sums[p] / counts[p] as f64;
                }
            }
            let mean = seasonal.iter().sum::<f64>() / period as f64;
            if mean.abs() > f64::EPSILON {
                for s in &mut seasonal {
                    *s /= mean;
                }
            }
        }

        let in_sample: Vec<f64> = trend
            .iter()
            .enumerate()
            .map(|(i, t)| t * seasonal[i % period])
            .collect();
        let residual_std = {
            let sq: f64 = values
                .iter()
                .zip(&in_sample)
                .map(|(v, f)| (v - f).powi(2))
                .sum();
            (sq / n as f64).sqrt()
        };

        self.state = Some(FitState {
            last_ts: series.points[n - 1].0,
            last_trend: trend[n - 1],
            last_slope: slope,
            seasonal,
            next_phase: n % period,
            residual_std,
            in_sample,
            n,
            cap: series.cap,
            floor: series.floor,
        });
        Ok(())
    }

    fn predict_in_sample(&self) -> Result<Vec<f64>, ModelError> {
        self.state
            .as_ref()
            .map(|s| s.in_sample.clone())
            .ok_or_else(|| ModelError("model not fitted".into()))
    }

    fn predict(&self, horizon: usize, step: Duration) -> Result<Vec<ForecastPoint>, ModelError> {
        let state = self
            .state
            .as_ref()
            .ok_or_else(|| ModelError("model not fitted".into()))?;

        let range = state.cap - state.floor;
        let mut points = Vec::with_capacity(horizon);
        let mut trend = state.last_trend;
        for i in 0..horizon {
            // Logistic damping: growth slows as the trend nears the cap, and
            // decline slows as it nears the floor.
            let occupancy = ((trend - state.floor) / range).clamp(0.0, 1.0);
            let damping = if state.last_slope >= 0.0 {
                1.0 - occupancy
            } else {
                occupancy
            };
            trend = (trend + state.last_slope * damping).clamp(state.floor, state.cap);

            let phase = (state.next_phase + i) % state.seasonal.len();
            let value = (trend * state.seasonal[phase]).clamp(state.floor, state.cap);

            let spread =
                INTERVAL_Z * state.residual_std * (1.0 + (i + 1) as f64 / state.n as f64).sqrt();
            let ts = state.last_ts + step * (i as i32 + 1);
            points.push(ForecastPoint {
                ts,
                value,
                lower: Some(value - spread),
                upper: Some(value + spread),
            });
        }
        Ok(points)
    }
}
