//! Engine configuration.
//!
//! Every tunable that drives the blend and the strategy tables lives here as
//! an explicit, fully enumerated value: weight tables, thresholds, the
//! changepoint grid, ATR multipliers with their name allow-lists, and the
//! rigorous-period list. Loadable from TOML; `validate` fails fast on a
//! weight table that does not cover every timeframe.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::domain::Timeframe;
use crate::forecast::sequence::NetworkSettings;

/// Fatal configuration defects. These indicate an incomplete deployment,
/// not a data problem, and are never absorbed into a fallback.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no blend weights configured for timeframe '{timeframe}'")]
    MissingWeights { timeframe: Timeframe },

    #[error("blend weights for '{timeframe}' must be non-negative")]
    NegativeWeights { timeframe: Timeframe },

    #[error("config file: {0}")]
    Io(String),

    #[error("config parse: {0}")]
    Parse(String),
}

/// Per-timeframe weights for the adaptive score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendWeights {
    pub classical: f64,
    pub sequence: f64,
    pub sentiment: f64,
}

/// ATR stop multipliers by ticker class, matched by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtrMultipliers {
    pub high_volatility: f64,
    pub high_volatility_names: Vec<String>,
    pub major: f64,
    pub major_names: Vec<String>,
    pub default: f64,
}

impl AtrMultipliers {
    /// Multiplier for a ticker, by case-insensitive substring match against
    /// the class allow-lists.
    pub fn for_ticker(&self, ticker: &str) -> f64 {
        let upper = ticker.to_uppercase();
        if self.high_volatility_names.iter().any(|n| upper.contains(n)) {
            self.high_volatility
        } else if self.major_names.iter().any(|n| upper.contains(n)) {
            self.major
        } else {
            self.default
        }
    }
}

impl Default for AtrMultipliers {
    fn default() -> Self {
        Self {
            high_volatility: 2.0,
            high_volatility_names: ["SOL", "PENDLE", "DOGE", "AVAX", "SAND", "SHIB"]
                .map(String::from)
                .to_vec(),
            major: 1.5,
            major_names: ["BTC", "ETH", "BNB", "ADA"].map(String::from).to_vec(),
            default: 1.2,
        }
    }
}

/// Sequence-model settings: window length plus network hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SequenceSettings {
    pub window: usize,
    pub network: NetworkSettings,
}

impl Default for SequenceSettings {
    fn default() -> Self {
        Self {
            window: 60,
            network: NetworkSettings::default(),
        }
    }
}

/// The full engine configuration.
///
/// Scalar fields come first so the TOML form serializes cleanly (values
/// before tables).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Outlier cutoff for the classical fit.
    pub zscore_cutoff: f64,
    /// Changepoint flexibility candidates for the adaptive search.
    pub changepoint_grid: Vec<f64>,
    /// Short-average share of the post-fit forecast blend.
    pub sma_blend: f64,
    /// Per-step change clamp for the sequence rollout.
    pub step_clamp_pct: f64,
    /// ATR is clamped to at most this fraction of price before levels.
    pub atr_cap_pct: f64,
    /// Periods that trigger the stricter decision table.
    pub rigorous_periods: Vec<String>,
    /// Forecast horizon, in grid units.
    pub horizon_units: usize,
    /// Adaptive-score weight table; must cover every timeframe.
    pub weights: BTreeMap<Timeframe, BlendWeights>,
    pub atr_multipliers: AtrMultipliers,
    pub sequence: SequenceSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let mut weights = BTreeMap::new();
        let intraday_fast = BlendWeights {
            classical: 0.05,
            sequence: 0.65,
            sentiment: 0.30,
        };
        let intraday_slow = BlendWeights {
            classical: 0.10,
            sequence: 0.60,
            sentiment: 0.30,
        };
        weights.insert(Timeframe::M15, intraday_fast);
        weights.insert(Timeframe::M30, intraday_fast);
        weights.insert(Timeframe::M45, intraday_fast);
        weights.insert(Timeframe::H1, intraday_slow);
        weights.insert(Timeframe::H2, intraday_slow);
        weights.insert(Timeframe::H6, intraday_slow);
        weights.insert(
            Timeframe::D1,
            BlendWeights {
                classical: 0.25,
                sequence: 0.45,
                sentiment: 0.30,
            },
        );
        weights.insert(
            Timeframe::W1,
            BlendWeights {
                classical: 0.40,
                sequence: 0.30,
                sentiment: 0.30,
            },
        );
        weights.insert(
            Timeframe::Mo1,
            BlendWeights {
                classical: 0.50,
                sequence: 0.20,
                sentiment: 0.30,
            },
        );

        Self {
            zscore_cutoff: 3.0,
            changepoint_grid: vec![0.01, 0.05, 0.10, 0.15],
            sma_blend: 0.2,
            step_clamp_pct: 0.03,
            atr_cap_pct: 0.05,
            rigorous_periods: ["3h", "4h", "6h", "12h", "1d"].map(String::from).to_vec(),
            horizon_units: 5,
            weights,
            atr_multipliers: AtrMultipliers::default(),
            sequence: SequenceSettings::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_toml_str(&text)
    }

    /// Deployment check: the weight table must cover every timeframe with
    /// non-negative weights.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for timeframe in Timeframe::ALL {
            let w = self
                .weights
                .get(&timeframe)
                .ok_or(ConfigError::MissingWeights { timeframe })?;
            if w.classical < 0.0 || w.sequence < 0.0 || w.sentiment < 0.0 {
                return Err(ConfigError::NegativeWeights { timeframe });
            }
        }
        Ok(())
    }

    pub fn is_rigorous_period(&self, period: &str) -> bool {
        self.rigorous_periods.iter().any(|p| p == period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn default_covers_every_timeframe() {
        let config = EngineConfig::default();
        for timeframe in Timeframe::ALL {
            assert!(config.weights.contains_key(&timeframe), "{timeframe} missing");
        }
    }

    #[test]
    fn sentiment_share_is_constant() {
        let config = EngineConfig::default();
        for (_, w) in &config.weights {
            assert_eq!(w.sentiment, 0.30);
        }
    }

    #[test]
    fn validate_rejects_gap() {
        let mut config = EngineConfig::default();
        config.weights.remove(&Timeframe::H2);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingWeights {
                timeframe: Timeframe::H2
            })
        ));
    }

    #[test]
    fn atr_multiplier_classes() {
        let m = AtrMultipliers::default();
        assert_eq!(m.for_ticker("SOL-USD"), 2.0);
        assert_eq!(m.for_ticker("shib-usd"), 2.0);
        assert_eq!(m.for_ticker("BTC-USD"), 1.5);
        assert_eq!(m.for_ticker("WEGE3"), 1.2);
    }

    #[test]
    fn rigorous_period_allow_list() {
        let config = EngineConfig::default();
        assert!(config.is_rigorous_period("1d"));
        assert!(config.is_rigorous_period("4h"));
        assert!(!config.is_rigorous_period("5d"));
        assert!(!config.is_rigorous_period("15min"));
    }

    #[test]
    fn toml_round_trip() {
        let config = EngineConfig::default();
        let text = toml::to_string(&config).unwrap();
        let parsed = EngineConfig::from_toml_str(&text).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let parsed = EngineConfig::from_toml_str("horizon_units = 3\n").unwrap();
        assert_eq!(parsed.horizon_units, 3);
        assert_eq!(parsed.zscore_cutoff, 3.0);
    }
}
