//! Strategy selector — the decision table over indicator state.
//!
//! Two table variants share one precedence order: oversold reversal,
//! overbought exhaustion, volatility breakout, moderate bullish momentum,
//! fallback. Rigorous periods gate the reversal branches on trend strength
//! plus a dual-average stretch; other periods gate on the candle reversal
//! validators and fall back to pure neutral.

use crate::blend::{Agreement, Microtrend};
use crate::config::EngineConfig;
use crate::domain::{
    round2, CandleSeries, Direction, StrategyContext, StrategyRecommendation, Trajectory,
};

use super::confidence;
use super::levels::{compute_levels, LevelInputs};
use super::reversal::{bearish_reversal, bullish_reversal};
use super::scenarios::Scenario;

const OVERSOLD: f64 = 40.0;
const OVERBOUGHT: f64 = 60.0;
const MOMENTUM_FLOOR: f64 = 50.0;
const TREND_STRENGTH: f64 = 15.0;
const DEEP_CHANNEL: f64 = -80.0;
const BREAKOUT_ATR: f64 = 3.0;

/// Everything the selector consumes for one request.
#[derive(Debug, Clone, Copy)]
pub struct StrategyInputs<'a> {
    pub ticker: &'a str,
    pub price: f64,
    pub rsi: f64,
    pub adx: Option<f64>,
    pub cci: Option<f64>,
    pub atr: Option<f64>,
    pub sma20: f64,
    pub sma50: f64,
    pub period: &'a str,
    pub candles: &'a CandleSeries,
    pub scenarios: &'a [Scenario],
    pub sequence: Option<&'a Trajectory>,
    pub classical: Option<&'a Trajectory>,
    pub agreement: Agreement,
    pub microtrend: Option<Microtrend>,
}

/// Run the decision table and derive levels, rationale, and confidence.
pub fn select(inputs: &StrategyInputs, cfg: &EngineConfig) -> StrategyRecommendation {
    let (direction, context) = if cfg.is_rigorous_period(inputs.period) {
        rigorous_table(inputs)
    } else {
        simple_table(inputs)
    };

    let levels = compute_levels(
        &LevelInputs {
            direction,
            entry: inputs.price,
            atr: inputs.atr,
            ticker: inputs.ticker,
            sequence: inputs.sequence,
            classical: inputs.classical,
            scenarios: inputs.scenarios,
        },
        cfg,
    );

    let confidence = confidence::grade(context, inputs.agreement, inputs.microtrend.as_ref());

    StrategyRecommendation {
        direction,
        entry: round2(inputs.price),
        levels,
        context,
        confidence,
        rationale: rationale(direction, context, inputs),
    }
}

/// Strict variant: oscillator zone + trend strength + dual-average stretch.
fn rigorous_table(inputs: &StrategyInputs) -> (Direction, StrategyContext) {
    let adx = inputs.adx.unwrap_or(0.0);
    let stretched_below = inputs.price < inputs.sma20 && inputs.price < inputs.sma50;
    let stretched_above = inputs.price > inputs.sma20 && inputs.price > inputs.sma50;

    if inputs.rsi < OVERSOLD {
        return if adx > TREND_STRENGTH && stretched_below {
            (Direction::Long, StrategyContext::ConfirmedReversal)
        } else {
            (Direction::Neutral, StrategyContext::NoConfirmation)
        };
    }

    if inputs.rsi > OVERBOUGHT {
        return if adx > TREND_STRENGTH && stretched_above {
            (Direction::Short, StrategyContext::ConfirmedOverbought)
        } else {
            (Direction::Neutral, StrategyContext::NoConfirmation)
        };
    }

    if let (Some(cci), Some(atr)) = (inputs.cci, inputs.atr) {
        if cci < DEEP_CHANNEL && atr > BREAKOUT_ATR {
            return (Direction::Short, StrategyContext::VolatilityBreakout);
        }
    }

    if inputs.rsi > MOMENTUM_FLOOR {
        if stretched_above {
            return (Direction::Long, StrategyContext::RobustMomentum);
        }
        if inputs.price > inputs.sma20 {
            return (Direction::Long, StrategyContext::Momentum);
        }
    }

    // Rigorous fallback drifts long without confirmation.
    (Direction::Long, StrategyContext::NeutralDrift)
}

/// Simple variant: oscillator zone + candle reversal validation.
fn simple_table(inputs: &StrategyInputs) -> (Direction, StrategyContext) {
    if inputs.rsi < OVERSOLD && bullish_reversal(inputs.candles, inputs.sma20) {
        return (Direction::Long, StrategyContext::ConfirmedReversal);
    }

    if inputs.rsi > OVERBOUGHT && bearish_reversal(inputs.candles, inputs.sma20) {
        return (Direction::Short, StrategyContext::ConfirmedOverbought);
    }

    if let (Some(cci), Some(atr)) = (inputs.cci, inputs.atr) {
        if cci < DEEP_CHANNEL && atr > BREAKOUT_ATR {
            return (Direction::Short, StrategyContext::VolatilityBreakout);
        }
    }

    if inputs.rsi > MOMENTUM_FLOOR && inputs.rsi <= OVERBOUGHT {
        if inputs.price > inputs.sma20 && inputs.price > inputs.sma50 {
            return (Direction::Long, StrategyContext::RobustMomentum);
        }
        if inputs.price > inputs.sma20 {
            return (Direction::Long, StrategyContext::Momentum);
        }
    }

    (Direction::Neutral, StrategyContext::NoConfirmation)
}

fn rationale(direction: Direction, context: StrategyContext, inputs: &StrategyInputs) -> String {
    let setup = match context {
        StrategyContext::ConfirmedReversal => {
            "oversold stretch with trend strength; reversal entry suggested"
        }
        StrategyContext::ConfirmedOverbought => {
            "overbought stretch with trend strength; exhaustion short suggested"
        }
        StrategyContext::VolatilityBreakout => {
            "deep channel deviation with elevated volatility; downside continuation"
        }
        StrategyContext::RobustMomentum => "buying pressure above both averages",
        StrategyContext::Momentum => "buying pressure above the short average",
        StrategyContext::NeutralDrift => "no confirmed setup; neutral drift with a long lean",
        StrategyContext::NoConfirmation => "no technical confirmation for an entry",
    };
    let micro = inputs
        .microtrend
        .map(|m| format!("; {}", m.phrase(inputs.price)))
        .unwrap_or_default();
    format!(
        "{} ({}) — models {}{}",
        setup,
        direction_word(direction),
        inputs.agreement.label(),
        micro
    )
}

fn direction_word(direction: Direction) -> &'static str {
    match direction {
        Direction::Long => "long",
        Direction::Short => "short",
        Direction::Neutral => "neutral",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_candles;

    fn series() -> CandleSeries {
        make_candles(&(0..30).map(|i| 100.0 + i as f64 * 0.1).collect::<Vec<_>>())
    }

    fn base_inputs<'a>(candles: &'a CandleSeries) -> StrategyInputs<'a> {
        StrategyInputs {
            ticker: "WEGE3",
            price: 100.0,
            rsi: 50.0,
            adx: Some(20.0),
            cci: Some(0.0),
            atr: Some(2.0),
            sma20: 100.0,
            sma50: 100.0,
            period: "1d",
            candles,
            scenarios: &[],
            sequence: None,
            classical: None,
            agreement: Agreement::Insufficient,
            microtrend: None,
        }
    }

    #[test]
    fn rigorous_oversold_stretch_goes_long() {
        let candles = series();
        let mut inputs = base_inputs(&candles);
        inputs.rsi = 25.0;
        inputs.price = 95.0;
        inputs.sma20 = 100.0;
        inputs.sma50 = 102.0;
        let rec = select(&inputs, &EngineConfig::default());
        assert_eq!(rec.direction, Direction::Long);
        assert_eq!(rec.context, StrategyContext::ConfirmedReversal);
        assert!(rec.levels.is_some());
    }

    #[test]
    fn rigorous_oversold_without_strength_is_neutral() {
        let candles = series();
        let mut inputs = base_inputs(&candles);
        inputs.rsi = 25.0;
        inputs.adx = Some(10.0);
        inputs.price = 95.0;
        let rec = select(&inputs, &EngineConfig::default());
        assert_eq!(rec.direction, Direction::Neutral);
        assert_eq!(rec.context, StrategyContext::NoConfirmation);
        assert!(rec.levels.is_none());
    }

    #[test]
    fn rigorous_overbought_stretch_goes_short() {
        let candles = series();
        let mut inputs = base_inputs(&candles);
        inputs.rsi = 75.0;
        inputs.adx = Some(18.0);
        inputs.price = 108.0;
        inputs.sma20 = 104.0;
        inputs.sma50 = 102.0;
        let rec = select(&inputs, &EngineConfig::default());
        assert_eq!(rec.direction, Direction::Short);
        assert_eq!(rec.context, StrategyContext::ConfirmedOverbought);
    }

    #[test]
    fn volatility_breakout_branch() {
        let candles = series();
        let mut inputs = base_inputs(&candles);
        inputs.cci = Some(-120.0);
        inputs.atr = Some(4.0);
        let rec = select(&inputs, &EngineConfig::default());
        assert_eq!(rec.direction, Direction::Short);
        assert_eq!(rec.context, StrategyContext::VolatilityBreakout);
    }

    #[test]
    fn absent_atr_skips_volatility_branch() {
        let candles = series();
        let mut inputs = base_inputs(&candles);
        inputs.cci = Some(-120.0);
        inputs.atr = None;
        let rec = select(&inputs, &EngineConfig::default());
        assert_ne!(rec.context, StrategyContext::VolatilityBreakout);
    }

    #[test]
    fn momentum_tiers() {
        let candles = series();
        let mut inputs = base_inputs(&candles);
        inputs.rsi = 55.0;
        inputs.price = 105.0;
        inputs.sma20 = 104.0;
        inputs.sma50 = 103.0;
        let rec = select(&inputs, &EngineConfig::default());
        assert_eq!(rec.context, StrategyContext::RobustMomentum);

        inputs.sma50 = 106.0;
        let rec = select(&inputs, &EngineConfig::default());
        assert_eq!(rec.context, StrategyContext::Momentum);
        assert_eq!(rec.direction, Direction::Long);
    }

    #[test]
    fn rigorous_fallback_is_long_drift() {
        let candles = series();
        let mut inputs = base_inputs(&candles);
        inputs.rsi = 45.0;
        let rec = select(&inputs, &EngineConfig::default());
        assert_eq!(rec.direction, Direction::Long);
        assert_eq!(rec.context, StrategyContext::NeutralDrift);
        assert!(rec.levels.is_some());
        assert_eq!(rec.confidence, crate::domain::Confidence::Low);
    }

    #[test]
    fn simple_fallback_is_pure_neutral() {
        let candles = series();
        let mut inputs = base_inputs(&candles);
        inputs.period = "5d";
        inputs.rsi = 45.0;
        let rec = select(&inputs, &EngineConfig::default());
        assert_eq!(rec.direction, Direction::Neutral);
        assert_eq!(rec.context, StrategyContext::NoConfirmation);
        assert!(rec.levels.is_none());
    }

    #[test]
    fn simple_oversold_needs_candle_confirmation() {
        let candles = series();
        let mut inputs = base_inputs(&candles);
        inputs.period = "5d";
        inputs.rsi = 25.0;
        // The synthetic series has no hammer at the tail.
        let rec = select(&inputs, &EngineConfig::default());
        assert_eq!(rec.direction, Direction::Neutral);
    }

    #[test]
    fn rationale_mentions_agreement() {
        let candles = series();
        let inputs = base_inputs(&candles);
        let rec = select(&inputs, &EngineConfig::default());
        assert!(rec.rationale.contains("insufficient data"));
    }
}
