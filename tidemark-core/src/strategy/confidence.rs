//! Confidence grading for a recommendation.
//!
//! Low whenever the selector landed on a fallback branch (nothing was
//! technically confirmed) or the models diverge. High needs a convergent
//! classification plus a nonzero microtrend delta; convergent-but-flat and
//! otherwise ambiguous cases grade Medium.

use crate::blend::{Agreement, Microtrend};
use crate::domain::{Confidence, StrategyContext};

pub fn grade(
    context: StrategyContext,
    agreement: Agreement,
    microtrend: Option<&Microtrend>,
) -> Confidence {
    if context.is_fallback() {
        return Confidence::Low;
    }

    match agreement {
        Agreement::ConvergentUp | Agreement::ConvergentDown => {
            match microtrend {
                Some(m) if m.delta != 0.0 => Confidence::High,
                _ => Confidence::Medium,
            }
        }
        Agreement::Divergent => Confidence::Low,
        Agreement::Insufficient => Confidence::Medium,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blend::MicrotrendDirection;

    fn moving() -> Microtrend {
        Microtrend {
            direction: MicrotrendDirection::Rising,
            delta: 0.42,
        }
    }

    fn flat() -> Microtrend {
        Microtrend {
            direction: MicrotrendDirection::Flat,
            delta: 0.0,
        }
    }

    #[test]
    fn fallback_branch_is_always_low() {
        assert_eq!(
            grade(
                StrategyContext::NeutralDrift,
                Agreement::ConvergentUp,
                Some(&moving())
            ),
            Confidence::Low
        );
        assert_eq!(
            grade(
                StrategyContext::NoConfirmation,
                Agreement::ConvergentDown,
                Some(&moving())
            ),
            Confidence::Low
        );
    }

    #[test]
    fn convergent_with_motion_is_high() {
        assert_eq!(
            grade(
                StrategyContext::ConfirmedReversal,
                Agreement::ConvergentUp,
                Some(&moving())
            ),
            Confidence::High
        );
        assert_eq!(
            grade(
                StrategyContext::ConfirmedOverbought,
                Agreement::ConvergentDown,
                Some(&moving())
            ),
            Confidence::High
        );
    }

    #[test]
    fn convergent_but_flat_is_medium() {
        assert_eq!(
            grade(
                StrategyContext::ConfirmedReversal,
                Agreement::ConvergentUp,
                Some(&flat())
            ),
            Confidence::Medium
        );
        assert_eq!(
            grade(StrategyContext::ConfirmedReversal, Agreement::ConvergentUp, None),
            Confidence::Medium
        );
    }

    #[test]
    fn divergent_is_low() {
        assert_eq!(
            grade(
                StrategyContext::ConfirmedOverbought,
                Agreement::Divergent,
                Some(&moving())
            ),
            Confidence::Low
        );
    }

    #[test]
    fn unknown_agreement_is_medium() {
        assert_eq!(
            grade(
                StrategyContext::Momentum,
                Agreement::Insufficient,
                Some(&moving())
            ),
            Confidence::Medium
        );
    }
}
