//! Forecaster adapters.
//!
//! Two independent adapters produce trajectories from the same candle
//! history: `classical` wraps a decomposable trend/seasonality model with
//! outlier trimming, adaptive flexibility search, and volatility-band
//! anchoring; `sequence` wraps a windowed recurrent network with artifact
//! caching and clamped autoregressive rollout. Both absorb internal model
//! failures into typed `Insufficient` results — an adapter never aborts the
//! caller's flow.

pub mod classical;
pub mod frequency;
pub mod outliers;
pub mod sequence;
pub mod trend_model;

pub use classical::{ClassicalForecaster, FitReport};
pub use frequency::FrequencyPlan;
pub use sequence::{ArtifactStore, SequenceForecaster};
pub use trend_model::{SeasonalLogistic, TrendModel};

use thiserror::Error;

/// Failure modes of the forecaster adapters.
///
/// `Insufficient` is always recoverable — callers degrade to a neutral
/// response. `ArtifactMissing` marks a contract violation (predict without a
/// loaded model) and is allowed to propagate. `TrainingInProgress` reports a
/// held advisory lock; callers fall back to a stale artifact or skip the
/// sequence leg.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("insufficient data: {reason}")]
    Insufficient { reason: String },

    #[error("no trained artifact loaded for '{ticker}'")]
    ArtifactMissing { ticker: String },

    #[error("training already in progress for '{ticker}'")]
    TrainingInProgress { ticker: String },

    #[error("artifact store: {0}")]
    Artifact(String),
}

impl ForecastError {
    pub fn insufficient(reason: impl Into<String>) -> Self {
        ForecastError::Insufficient {
            reason: reason.into(),
        }
    }

    /// True for the recoverable class that callers absorb into a fallback.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ForecastError::Insufficient { .. } | ForecastError::TrainingInProgress { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverable_classification() {
        assert!(ForecastError::insufficient("too short").is_recoverable());
        assert!(ForecastError::TrainingInProgress {
            ticker: "SOL-USD".into()
        }
        .is_recoverable());
        assert!(!ForecastError::ArtifactMissing {
            ticker: "SOL-USD".into()
        }
        .is_recoverable());
    }
}
