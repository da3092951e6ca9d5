//! Adaptive scorer — one scalar from the three directional inputs, weighted
//! by timeframe granularity.
//!
//! Intraday frames lean on the sequence model; longer frames shift weight
//! toward the classical model. Indicator sentiment holds a fixed share
//! across all granularities. A timeframe without configured weights is a
//! deployment defect and fails fast.

use std::collections::BTreeMap;

use crate::config::{BlendWeights, ConfigError};
use crate::domain::{round2, Timeframe, TrendBias};

/// Map a directional bias to its score contribution.
pub fn direction_score(bias: TrendBias) -> i32 {
    match bias {
        TrendBias::Up => 1,
        TrendBias::Down => -1,
        TrendBias::Neutral => 0,
    }
}

/// Weighted sum of the three directional inputs, rounded to 2 decimals.
///
/// Pure function of its inputs; the weight table must cover the timeframe
/// or the call fails with a configuration error.
pub fn adaptive_score(
    classical: TrendBias,
    sequence: TrendBias,
    sentiment: i32,
    timeframe: Timeframe,
    weights: &BTreeMap<Timeframe, BlendWeights>,
) -> Result<f64, ConfigError> {
    let w = weights
        .get(&timeframe)
        .ok_or(ConfigError::MissingWeights { timeframe })?;

    let score = direction_score(classical) as f64 * w.classical
        + direction_score(sequence) as f64 * w.sequence
        + sentiment as f64 * w.sentiment;
    Ok(round2(score))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    fn weights() -> BTreeMap<Timeframe, BlendWeights> {
        EngineConfig::default().weights
    }

    #[test]
    fn intraday_leans_on_sequence_model() {
        let w = weights();
        // Sequence up alone on a 15-minute frame carries 0.65.
        let score = adaptive_score(
            TrendBias::Neutral,
            TrendBias::Up,
            0,
            Timeframe::M15,
            &w,
        )
        .unwrap();
        assert_eq!(score, 0.65);
    }

    #[test]
    fn daily_rebalances_toward_classical() {
        let w = weights();
        let score = adaptive_score(TrendBias::Up, TrendBias::Neutral, 0, Timeframe::D1, &w).unwrap();
        assert_eq!(score, 0.25);
    }

    #[test]
    fn all_bullish_daily() {
        let w = weights();
        // 0.25 + 0.45 + 0.30 = 1.0
        let score = adaptive_score(TrendBias::Up, TrendBias::Up, 1, Timeframe::D1, &w).unwrap();
        assert_eq!(score, 1.0);
    }

    #[test]
    fn mixed_signals_cancel() {
        let w = weights();
        let score = adaptive_score(TrendBias::Down, TrendBias::Up, 0, Timeframe::H1, &w).unwrap();
        // -0.10 + 0.60 = 0.50
        assert_eq!(score, 0.5);
    }

    #[test]
    fn sentiment_can_stack_beyond_unity() {
        let w = weights();
        let score = adaptive_score(TrendBias::Up, TrendBias::Up, 3, Timeframe::D1, &w).unwrap();
        assert_eq!(score, 1.6);
    }

    #[test]
    fn missing_timeframe_is_configuration_error() {
        let mut w = weights();
        w.remove(&Timeframe::Mo1);
        let result = adaptive_score(TrendBias::Up, TrendBias::Up, 0, Timeframe::Mo1, &w);
        assert!(matches!(
            result,
            Err(ConfigError::MissingWeights {
                timeframe: Timeframe::Mo1
            })
        ));
    }
}
