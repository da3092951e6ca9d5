//! Strategy recommendation — the immutable final output of an analysis.

use serde::{Deserialize, Serialize};

/// Directional call of the strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
    Neutral,
}

/// Qualitative confidence grade attached to a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Which decision-table branch produced the recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyContext {
    /// Oversold stretch with trend strength — reversal entry confirmed.
    ConfirmedReversal,
    /// Overbought stretch with trend strength — exhaustion short confirmed.
    ConfirmedOverbought,
    /// Deep channel deviation with elevated volatility.
    VolatilityBreakout,
    /// Moderate bullish momentum above both averages.
    RobustMomentum,
    /// Moderate bullish momentum above the short average.
    Momentum,
    /// Rigorous-table fallback: drift long without technical confirmation.
    NeutralDrift,
    /// No branch matched; nothing confirmed.
    NoConfirmation,
}

impl StrategyContext {
    /// True for the fallback branches, where no reversal or momentum setup
    /// was technically confirmed. Confidence is graded Low for these.
    pub fn is_fallback(&self) -> bool {
        matches!(
            self,
            StrategyContext::NeutralDrift | StrategyContext::NoConfirmation
        )
    }

    pub fn describe(&self) -> &'static str {
        match self {
            StrategyContext::ConfirmedReversal => "reversal confirmed",
            StrategyContext::ConfirmedOverbought => "overbought confirmed",
            StrategyContext::VolatilityBreakout => "volatility breakout",
            StrategyContext::RobustMomentum => "robust momentum strength",
            StrategyContext::Momentum => "momentum strength",
            StrategyContext::NeutralDrift => "neutral drift",
            StrategyContext::NoConfirmation => "no confirmation",
        }
    }
}

/// Take-profit ladder and protective stop.
///
/// Invariant: `tp1 < tp2 < tp3` for long, `tp1 > tp2 > tp3` for short.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetLevels {
    pub tp1: f64,
    pub tp2: f64,
    pub tp3: f64,
    pub stop: f64,
}

/// Final recommendation for one analysis request. Never mutated after
/// construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyRecommendation {
    pub direction: Direction,
    pub entry: f64,
    /// Absent for neutral calls — there is nothing to ladder into.
    pub levels: Option<TargetLevels>,
    pub context: StrategyContext,
    pub confidence: Confidence,
    pub rationale: String,
}
