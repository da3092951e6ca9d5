//! Sequence forecaster adapter — train/cache/predict lifecycle per ticker.

use chrono::{Duration, NaiveDateTime};

use crate::domain::{round2, trajectory::bias_from_endpoints, CandleSeries, ForecastPoint, Trajectory};

use super::super::ForecastError;
use super::artifact::{hash_training_window, ArtifactMeta, ArtifactStore};
use super::network::{NetworkSettings, SequenceNetwork};
use super::scaler::MinMaxScaler;

/// Per-step change clamp for the autoregressive rollout: a predicted step
/// may not differ from the previous predicted step by more than this
/// fraction in either direction.
pub const STEP_CLAMP_PCT: f64 = 0.03;

/// Stateful adapter around the recurrent network for a single ticker.
///
/// Callers are expected to pre-check `has_trained_artifact` and route to
/// `load_artifact` or `train`; `predict` without a loaded model is a
/// contract violation and returns `ArtifactMissing`.
pub struct SequenceForecaster {
    ticker: String,
    window: usize,
    settings: NetworkSettings,
    store: ArtifactStore,
    network: Option<SequenceNetwork>,
    scaler: Option<MinMaxScaler>,
    /// Normalized trailing closes, most recent last.
    training_data: Option<Vec<f64>>,
}

impl SequenceForecaster {
    pub fn new(
        ticker: impl Into<String>,
        window: usize,
        settings: NetworkSettings,
        store: ArtifactStore,
    ) -> Self {
        assert!(window >= 2, "window must be >= 2");
        Self {
            ticker: ticker.into(),
            window,
            settings,
            store,
            network: None,
            scaler: None,
            training_data: None,
        }
    }

    pub fn has_trained_artifact(&self) -> bool {
        self.store.has(&self.ticker, self.window)
    }

    /// Load the persisted network and normalizer for this ticker.
    pub fn load_artifact(&mut self) -> Result<(), ForecastError> {
        let (network, scaler) = self.store.load(&self.ticker, self.window)?;
        self.network = Some(network);
        self.scaler = Some(scaler);
        Ok(())
    }

    /// Normalize the trailing closes into the training buffer.
    ///
    /// Requires at least `window + 1` finite closes. When an artifact is
    /// already loaded its saved normalizer is reused; otherwise a fresh
    /// normalizer is fitted for the upcoming training run.
    pub fn load_training_data(&mut self, series: &CandleSeries) -> Result<(), ForecastError> {
        let closes: Vec<f64> = series
            .closes()
            .into_iter()
            .filter(|v| v.is_finite())
            .collect();
        if closes.len() < self.window + 1 {
            return Err(ForecastError::insufficient(format!(
                "'{}' has {} usable closes, need {}",
                self.ticker,
                closes.len(),
                self.window + 1
            )));
        }

        let scaler = match &self.scaler {
            Some(existing) => existing.clone(),
            None => MinMaxScaler::fit(&closes)?,
        };
        self.training_data = Some(scaler.transform_all(&closes));
        self.scaler = Some(scaler);
        Ok(())
    }

    /// Train a fresh network on the loaded buffer and persist the artifact.
    ///
    /// Holds the advisory per-ticker training lock for the duration;
    /// concurrent callers observe `TrainingInProgress` rather than racing
    /// the overwrite.
    pub fn train(&mut self) -> Result<(), ForecastError> {
        let data = self
            .training_data
            .clone()
            .ok_or_else(|| ForecastError::insufficient("training data not loaded"))?;
        let scaler = self
            .scaler
            .clone()
            .ok_or_else(|| ForecastError::insufficient("normalizer not fitted"))?;

        let _guard = self.store.acquire_training_lock(&self.ticker, self.window)?;

        let (windows, targets) = sliding_pairs(&data, self.window);
        let mut network = SequenceNetwork::new(&self.settings);
        network.train(&windows, &targets, &self.settings);

        let meta = ArtifactMeta {
            ticker: self.ticker.clone(),
            window: self.window,
            hidden: self.settings.hidden,
            data_hash: hash_training_window(&data),
            trained_at: last_observed_now(),
        };
        self.store
            .save(&self.ticker, self.window, &network, &scaler, &meta)?;
        self.network = Some(network);
        Ok(())
    }

    /// Autoregressive rollout: predict one step, append it to the trailing
    /// window, repeat. Each step is clamped to ±3% of the previous predicted
    /// step; output is denormalized and rounded to 2 decimals.
    pub fn predict(
        &self,
        steps: usize,
        from: NaiveDateTime,
        step: Duration,
    ) -> Result<Trajectory, ForecastError> {
        let network = self.network.as_ref().ok_or(ForecastError::ArtifactMissing {
            ticker: self.ticker.clone(),
        })?;
        let scaler = self.scaler.as_ref().ok_or(ForecastError::ArtifactMissing {
            ticker: self.ticker.clone(),
        })?;
        let data = self
            .training_data
            .as_ref()
            .ok_or_else(|| ForecastError::insufficient("training data not loaded"))?;
        if data.len() < self.window {
            return Err(ForecastError::insufficient("window larger than buffer"));
        }

        let mut trailing: Vec<f64> = data[data.len() - self.window..].to_vec();
        let mut predicted: Vec<f64> = Vec::with_capacity(steps);

        for _ in 0..steps {
            let raw = scaler.inverse(network.forward(&trailing));
            let value = match predicted.last() {
                Some(&prev) => clamp_step(prev, raw, STEP_CLAMP_PCT),
                None => raw,
            };
            predicted.push(value);
            trailing.remove(0);
            trailing.push(scaler.transform(value));
        }

        let points: Vec<ForecastPoint> = predicted
            .iter()
            .enumerate()
            .map(|(i, &v)| ForecastPoint::point(from + step * (i as i32 + 1), round2(v)))
            .collect();
        let bias = match (points.first(), points.last()) {
            (Some(first), Some(last)) => {
                bias_from_endpoints(first.value, last.value, first.value)
            }
            _ => crate::domain::TrendBias::Neutral,
        };

        Ok(Trajectory {
            points,
            bias,
            warnings: Vec::new(),
        })
    }
}

/// Clamp `next` to within `pct` of `prev` in either direction.
pub fn clamp_step(prev: f64, next: f64, pct: f64) -> f64 {
    if prev.abs() <= f64::EPSILON {
        return next;
    }
    let change = (next - prev) / prev;
    if change > pct {
        prev * (1.0 + pct)
    } else if change < -pct {
        prev * (1.0 - pct)
    } else {
        next
    }
}

/// Fixed-length (window, next value) pairs slid over the normalized series.
fn sliding_pairs(data: &[f64], window: usize) -> (Vec<Vec<f64>>, Vec<f64>) {
    let mut windows = Vec::new();
    let mut targets = Vec::new();
    for i in 0..data.len() - window {
        windows.push(data[i..i + window].to_vec());
        targets.push(data[i + window]);
    }
    (windows, targets)
}

/// Training timestamp for the metadata sidecar, taken from the wall clock at
/// save time.
fn last_observed_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}
