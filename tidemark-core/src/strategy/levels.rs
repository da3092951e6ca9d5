//! Target/stop derivation.
//!
//! ATR is clamped to at most 5% of price so illiquid or gapped data cannot
//! produce degenerate stops. With a usable ATR the take-profit ladder sits
//! at 0.5/1.0/1.5 × clamped ATR, each rung additionally capped (long) or
//! floored (short) by the models' consensus extreme; the stop uses a
//! ticker-class multiplier. With no usable ATR the fixed-percentage ladder
//! applies — that fallback is never skipped. Levels always come back in
//! monotonic order matching the direction.

use crate::config::EngineConfig;
use crate::domain::{round2, Direction, TargetLevels, Trajectory};

use super::scenarios::{Scenario, ScenarioKind};

/// Everything the ladder derivation needs besides the config.
#[derive(Debug, Clone, Copy)]
pub struct LevelInputs<'a> {
    pub direction: Direction,
    pub entry: f64,
    pub atr: Option<f64>,
    pub ticker: &'a str,
    pub sequence: Option<&'a Trajectory>,
    pub classical: Option<&'a Trajectory>,
    pub scenarios: &'a [Scenario],
}

/// Compute the ladder for a directional call. `None` for neutral.
pub fn compute_levels(inputs: &LevelInputs, cfg: &EngineConfig) -> Option<TargetLevels> {
    let long = match inputs.direction {
        Direction::Long => true,
        Direction::Short => false,
        Direction::Neutral => return None,
    };

    let entry = round2(inputs.entry);
    let multiplier = cfg.atr_multipliers.for_ticker(inputs.ticker);
    let atr_clamped = inputs
        .atr
        .filter(|a| a.is_finite() && *a > 0.0)
        .map(|a| a.min(inputs.entry * cfg.atr_cap_pct))
        .unwrap_or(0.0);

    let mut levels = if atr_clamped > 0.0 {
        if long {
            let cap = model_extreme(inputs, true).unwrap_or(entry * 1.03);
            TargetLevels {
                tp1: round2(entry + atr_clamped * 0.5).min(cap),
                tp2: round2(entry + atr_clamped).min(cap * 1.005),
                tp3: round2(entry + atr_clamped * 1.5).min(cap * 1.010),
                stop: round2(entry - atr_clamped * multiplier),
            }
        } else {
            let floor = model_extreme(inputs, false).unwrap_or(entry * 0.97);
            TargetLevels {
                tp1: round2(entry - atr_clamped * 0.5).max(floor),
                tp2: round2(entry - atr_clamped).max(floor * 0.995),
                tp3: round2(entry - atr_clamped * 1.5).max(floor * 0.990),
                stop: round2(entry + atr_clamped * multiplier),
            }
        }
    } else if long {
        TargetLevels {
            tp1: round2(entry * 1.02),
            tp2: round2(entry * 1.04),
            tp3: round2(entry * 1.06),
            stop: round2(entry * 0.99),
        }
    } else {
        TargetLevels {
            tp1: round2(entry * 0.98),
            tp2: round2(entry * 0.96),
            tp3: round2(entry * 0.94),
            stop: round2(entry * 1.01),
        }
    };

    apply_scenarios(&mut levels, long, inputs.scenarios);
    levels.tp1 = round2(levels.tp1);
    levels.tp2 = round2(levels.tp2);
    levels.tp3 = round2(levels.tp3);
    levels.stop = round2(levels.stop);
    order_ladder(&mut levels, long);
    enforce_spacing(&mut levels, long);
    Some(levels)
}

/// Most optimistic (long) or pessimistic (short) level across both models.
fn model_extreme(inputs: &LevelInputs, long: bool) -> Option<f64> {
    let candidates = [
        inputs.sequence.and_then(|t| {
            if long {
                t.max_upper()
            } else {
                t.min_lower()
            }
        }),
        inputs.classical.and_then(|t| {
            if long {
                t.max_upper()
            } else {
                t.min_lower()
            }
        }),
    ];
    candidates
        .into_iter()
        .flatten()
        .fold(None, |acc: Option<f64>, v| {
            Some(match acc {
                Some(a) if long => a.max(v),
                Some(a) => a.min(v),
                None => v,
            })
        })
}

/// Widen tp3 to a consistent scenario's target and tighten the stop just
/// beyond its trigger. Unparsable records are skipped silently.
fn apply_scenarios(levels: &mut TargetLevels, long: bool, scenarios: &[Scenario]) {
    for scenario in scenarios {
        let consistent = matches!(
            (scenario.kind(), long),
            (Some(ScenarioKind::Breakout), true) | (Some(ScenarioKind::Breakdown), false)
        );
        if !consistent {
            continue;
        }
        let (Some(target), Some(trigger)) = (scenario.target_price(), scenario.trigger_price())
        else {
            continue;
        };
        if long {
            levels.tp3 = levels.tp3.max(target);
            levels.stop = levels.stop.min(trigger - 0.5);
        } else {
            levels.tp3 = levels.tp3.min(target);
            levels.stop = trigger + 0.5;
        }
    }
}

fn order_ladder(levels: &mut TargetLevels, long: bool) {
    let mut tps = [levels.tp1, levels.tp2, levels.tp3];
    tps.sort_by(f64::total_cmp);
    if !long {
        tps.reverse();
    }
    [levels.tp1, levels.tp2, levels.tp3] = tps;
}

/// Rungs must stay strictly ordered even when rounding or tight model caps
/// collapse them; a one-cent minimum spacing restores the invariant.
fn enforce_spacing(levels: &mut TargetLevels, long: bool) {
    let cent: f64 = if long { 0.01 } else { -0.01 };
    if (levels.tp2 - levels.tp1) * cent.signum() <= 0.0 {
        levels.tp2 = round2(levels.tp1 + cent);
    }
    if (levels.tp3 - levels.tp2) * cent.signum() <= 0.0 {
        levels.tp3 = round2(levels.tp2 + cent);
    }
}
