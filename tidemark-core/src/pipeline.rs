//! Analysis pipeline — one synchronous, blocking run per request.
//!
//! Candles → indicator snapshot → both forecasters (independent, run under
//! `rayon::join`) → reconciliation → sentiment + adaptive score →
//! microtrend → strategy selection. Every stage has an explicit
//! insufficient-data exit that degrades the run to a neutral fallback
//! report; only configuration errors propagate as faults.

use rayon::join;
use serde::Serialize;
use thiserror::Error;

use crate::blend::{
    combine, microtrend, read_indicators, sentiment_score, Agreement, IndicatorReading,
    Microtrend, Reconciliation,
};
use crate::blend::scorer::adaptive_score;
use crate::config::{ConfigError, EngineConfig};
use crate::data::{CandleProvider, DataError};
use crate::domain::{
    round2, CandleSeries, Confidence, Direction, StrategyContext, StrategyRecommendation,
    Timeframe, Trajectory, TrendBias,
};
use crate::forecast::sequence::{ArtifactStore, SequenceForecaster};
use crate::forecast::{ClassicalForecaster, FitReport, ForecastError, FrequencyPlan};
use crate::indicators::{adx, atr, cci, retracements, vwap, IndicatorSnapshot, SnapshotRow};
use crate::strategy::{alternative_scenarios, select, Scenario, StrategyInputs};

const RECONCILE_TAIL: usize = 3;

/// Faults that abort a run. Everything else degrades in place.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// The full structured result of one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub ticker: String,
    pub timeframe: Timeframe,
    pub period: String,
    pub price: f64,
    pub row: Option<SnapshotRow>,
    pub adx: Option<f64>,
    pub cci: Option<f64>,
    pub atr: Option<f64>,
    pub vwap: Option<f64>,
    pub fibonacci: Vec<(String, f64)>,
    pub readings: Vec<IndicatorReading>,
    pub scenarios: Vec<Scenario>,
    pub classical: Option<Trajectory>,
    pub sequence: Option<Trajectory>,
    /// Adaptive flexibility search outcome, when the classical leg ran.
    pub fit: Option<FitReport>,
    pub reconciliation: Reconciliation,
    pub score: f64,
    pub microtrend: Option<Microtrend>,
    pub recommendation: StrategyRecommendation,
    pub warnings: Vec<String>,
}

/// Orchestrates one analysis request against the collaborator seams.
pub struct Analyzer<'a> {
    provider: &'a dyn CandleProvider,
    artifacts: ArtifactStore,
    cfg: EngineConfig,
}

impl<'a> Analyzer<'a> {
    pub fn new(provider: &'a dyn CandleProvider, artifacts: ArtifactStore, cfg: EngineConfig) -> Self {
        Self {
            provider,
            artifacts,
            cfg,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    /// Run the full pipeline. The recommendation always renders; data
    /// shortfalls produce a neutral fallback rather than an error.
    pub fn run(
        &self,
        ticker: &str,
        timeframe: Timeframe,
        period: &str,
    ) -> Result<AnalysisReport, AnalysisError> {
        self.cfg.validate()?;
        let series = self.provider.fetch(ticker, timeframe, period)?;

        let snapshot = match IndicatorSnapshot::compute(&series, timeframe) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                return Ok(self.fallback_report(ticker, timeframe, period, &series, e.to_string()))
            }
        };
        let row = snapshot.last();
        let price = row.close;
        let mut warnings = Vec::new();

        // The two forecasters are independent; neither reads the other's
        // output, so they run side by side.
        let classical_forecaster = ClassicalForecaster::new(
            self.cfg.zscore_cutoff,
            self.cfg.changepoint_grid.clone(),
            self.cfg.sma_blend,
        );
        let horizon_units = self.cfg.horizon_units;
        let (classical_result, sequence_result) = join(
            || classical_forecaster.forecast_adaptive(&series, &row, horizon_units, Some(timeframe)),
            || self.sequence_forecast(ticker, timeframe, &series),
        );

        let (classical, fit) = match classical_result {
            Ok((trajectory, fit)) => {
                warnings.extend(trajectory.warnings.iter().cloned());
                (Some(trajectory), Some(fit))
            }
            Err(e) => {
                warnings.push(format!("classical forecast unavailable: {e}"));
                (None, None)
            }
        };
        let sequence = match sequence_result {
            Ok(trajectory) => Some(trajectory),
            Err(e) => {
                warnings.push(format!("sequence forecast unavailable: {e}"));
                None
            }
        };

        let reconciliation = combine(
            sequence.as_ref().map(|t| t.tail(RECONCILE_TAIL)).unwrap_or(&[]),
            classical.as_ref().map(|t| t.tail(RECONCILE_TAIL)).unwrap_or(&[]),
        );

        let readings = read_indicators(&row);
        let sentiment = sentiment_score(&readings);
        let classical_bias = classical.as_ref().map(|t| t.bias).unwrap_or(TrendBias::Neutral);
        let sequence_bias = sequence
            .as_ref()
            .and_then(|t| t.points.last())
            .map(|last| {
                if last.value > price {
                    TrendBias::Up
                } else {
                    TrendBias::Down
                }
            })
            .unwrap_or(TrendBias::Neutral);
        let score = adaptive_score(
            classical_bias,
            sequence_bias,
            sentiment,
            timeframe,
            &self.cfg.weights,
        )?;

        let micro = sequence
            .as_ref()
            .and_then(|t| microtrend(t.head(RECONCILE_TAIL), price));

        let scenarios = alternative_scenarios(price);
        let scalar_adx = adx(series.candles(), 14);
        let scalar_cci = cci(series.candles(), 20);
        let scalar_atr = atr(series.candles(), 14);
        let scalar_vwap = vwap(series.candles());

        let recommendation = select(
            &StrategyInputs {
                ticker,
                price,
                rsi: row.rsi,
                adx: scalar_adx,
                cci: scalar_cci,
                atr: scalar_atr,
                sma20: row.sma20,
                sma50: row.sma50,
                period,
                candles: &series,
                scenarios: &scenarios,
                sequence: sequence.as_ref(),
                classical: classical.as_ref(),
                agreement: reconciliation.agreement,
                microtrend: micro,
            },
            &self.cfg,
        );

        let (low, high) = price_extent(&snapshot);
        Ok(AnalysisReport {
            ticker: ticker.to_string(),
            timeframe,
            period: period.to_string(),
            price: round2(price),
            row: Some(row),
            adx: scalar_adx,
            cci: scalar_cci,
            atr: scalar_atr,
            vwap: scalar_vwap,
            fibonacci: owned_fibonacci(low, high),
            readings,
            scenarios,
            classical,
            sequence,
            fit,
            reconciliation,
            score,
            microtrend: micro,
            recommendation,
            warnings,
        })
    }

    /// Sequence leg: reuse the artifact when present, otherwise train once.
    /// A training lock held elsewhere degrades to the stale artifact when
    /// one exists.
    fn sequence_forecast(
        &self,
        ticker: &str,
        timeframe: Timeframe,
        series: &CandleSeries,
    ) -> Result<Trajectory, ForecastError> {
        let window = self.cfg.sequence.window;
        let mut forecaster = SequenceForecaster::new(
            ticker,
            window,
            self.cfg.sequence.network,
            self.artifacts.clone(),
        );

        if forecaster.has_trained_artifact() {
            forecaster.load_artifact()?;
            forecaster.load_training_data(series)?;
        } else {
            forecaster.load_training_data(series)?;
            match forecaster.train() {
                Ok(()) => {}
                Err(ForecastError::TrainingInProgress { .. })
                    if forecaster.has_trained_artifact() =>
                {
                    forecaster.load_artifact()?;
                }
                Err(e) => return Err(e),
            }
        }

        let plan = FrequencyPlan::resolve(Some(timeframe), series);
        let from = series
            .last()
            .map(|c| c.ts)
            .ok_or_else(|| ForecastError::insufficient("empty series"))?;
        forecaster.predict(plan.horizon_steps(self.cfg.horizon_units), from, plan.step)
    }

    /// Neutral fallback when indicators cannot be computed. The report
    /// still renders with whatever price information exists.
    fn fallback_report(
        &self,
        ticker: &str,
        timeframe: Timeframe,
        period: &str,
        series: &CandleSeries,
        reason: String,
    ) -> AnalysisReport {
        let price = series.last_close().unwrap_or(0.0);
        AnalysisReport {
            ticker: ticker.to_string(),
            timeframe,
            period: period.to_string(),
            price: round2(price),
            row: None,
            adx: None,
            cci: None,
            atr: None,
            vwap: None,
            fibonacci: Vec::new(),
            readings: Vec::new(),
            scenarios: Vec::new(),
            classical: None,
            sequence: None,
            fit: None,
            reconciliation: Reconciliation {
                agreement: Agreement::Insufficient,
                weighted_mean: None,
            },
            score: 0.0,
            microtrend: None,
            recommendation: StrategyRecommendation {
                direction: Direction::Neutral,
                entry: round2(price),
                levels: None,
                context: StrategyContext::NoConfirmation,
                confidence: Confidence::Low,
                rationale: format!("insufficient data: {reason}"),
            },
            warnings: vec![reason],
        }
    }
}

fn price_extent(snapshot: &IndicatorSnapshot) -> (f64, f64) {
    let mut low = f64::INFINITY;
    let mut high = f64::NEG_INFINITY;
    for &c in &snapshot.close {
        low = low.min(c);
        high = high.max(c);
    }
    (low, high)
}

fn owned_fibonacci(low: f64, high: f64) -> Vec<(String, f64)> {
    retracements(low, high)
        .into_iter()
        .map(|(label, price)| (label.to_string(), price))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SequenceSettings;
    use crate::forecast::sequence::NetworkSettings;
    use crate::indicators::make_candles;

    struct FixedProvider {
        series: CandleSeries,
    }

    impl CandleProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        fn fetch(
            &self,
            _ticker: &str,
            _timeframe: Timeframe,
            _period: &str,
        ) -> Result<CandleSeries, DataError> {
            Ok(self.series.clone())
        }
    }

    fn test_config() -> EngineConfig {
        EngineConfig {
            sequence: SequenceSettings {
                window: 8,
                network: NetworkSettings {
                    hidden: 4,
                    epochs: 2,
                    learning_rate: 0.05,
                    patience: 2,
                    seed: 7,
                },
            },
            horizon_units: 1,
            ..EngineConfig::default()
        }
    }

    fn wave(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + (i as f64 * 0.35).sin() * 4.0 + i as f64 * 0.05)
            .collect()
    }

    #[test]
    fn short_series_degrades_to_neutral() {
        let provider = FixedProvider {
            series: make_candles(&wave(10)),
        };
        let dir = tempfile::tempdir().unwrap();
        let analyzer = Analyzer::new(&provider, ArtifactStore::new(dir.path()), test_config());

        let report = analyzer.run("WEGE3", Timeframe::H1, "5d").unwrap();
        assert_eq!(report.recommendation.direction, Direction::Neutral);
        assert_eq!(report.reconciliation.agreement, Agreement::Insufficient);
        assert_eq!(report.score, 0.0);
        assert!(!report.warnings.is_empty());
        assert!(report.price > 0.0);
    }

    #[test]
    fn full_run_produces_complete_report() {
        let provider = FixedProvider {
            series: make_candles(&wave(60)),
        };
        let dir = tempfile::tempdir().unwrap();
        let analyzer = Analyzer::new(&provider, ArtifactStore::new(dir.path()), test_config());

        let report = analyzer.run("SOL-USD", Timeframe::H1, "5d").unwrap();
        assert!(report.row.is_some());
        assert!(report.classical.is_some());
        assert!(report.sequence.is_some());
        assert_ne!(report.reconciliation.agreement, Agreement::Insufficient);
        assert!(report.reconciliation.weighted_mean.is_some());
        assert_eq!(report.fibonacci.len(), 6);
        assert_eq!(report.scenarios.len(), 2);
    }

    #[test]
    fn invalid_config_fails_fast() {
        let provider = FixedProvider {
            series: make_candles(&wave(60)),
        };
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = test_config();
        cfg.weights.remove(&Timeframe::H1);
        let analyzer = Analyzer::new(&provider, ArtifactStore::new(dir.path()), cfg);

        let result = analyzer.run("SOL-USD", Timeframe::H1, "5d");
        assert!(matches!(result, Err(AnalysisError::Config(_))));
    }
}
