//! Model reconciliation — agreement between the two forecasters' short
//! horizons, and a single weighted consensus value.
//!
//! The sequence model is weighted higher because it reacts faster to recent
//! short-horizon moves.

use serde::{Deserialize, Serialize};

use crate::domain::{round2, ForecastPoint};

const SEQUENCE_WEIGHT: f64 = 0.6;
const CLASSICAL_WEIGHT: f64 = 0.4;
const TAIL: usize = 3;

/// Semantic agreement classification. `label` adds a display glyph; this
/// enum is the contract surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Agreement {
    ConvergentUp,
    ConvergentDown,
    Divergent,
    Insufficient,
}

impl Agreement {
    pub fn is_convergent(&self) -> bool {
        matches!(self, Agreement::ConvergentUp | Agreement::ConvergentDown)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Agreement::ConvergentUp => "↑ convergent-up",
            Agreement::ConvergentDown => "↓ convergent-down",
            Agreement::Divergent => "↔ divergent",
            Agreement::Insufficient => "insufficient data",
        }
    }
}

/// Result of reconciling the two model tails.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub agreement: Agreement,
    /// Absent — not zero — when either model contributed nothing.
    pub weighted_mean: Option<f64>,
}

/// Combine the last ≤3 points of each model.
///
/// Tails are ordered by timestamp internally, so the outcome depends only on
/// the sampled set, not on the order the caller supplies it in. An empty
/// side yields the explicit insufficient classification with no consensus
/// value.
pub fn combine(sequence_tail: &[ForecastPoint], classical_tail: &[ForecastPoint]) -> Reconciliation {
    let sequence = sorted_tail(sequence_tail);
    let classical = sorted_tail(classical_tail);

    if sequence.is_empty() || classical.is_empty() {
        return Reconciliation {
            agreement: Agreement::Insufficient,
            weighted_mean: None,
        };
    }

    let seq_mean = mean(&sequence);
    let cls_mean = mean(&classical);
    let weighted_mean = round2(SEQUENCE_WEIGHT * seq_mean + CLASSICAL_WEIGHT * cls_mean);

    let agreement = if seq_mean > sequence[0] && cls_mean > classical[0] {
        Agreement::ConvergentUp
    } else if seq_mean < sequence[0] && cls_mean < classical[0] {
        Agreement::ConvergentDown
    } else {
        Agreement::Divergent
    };

    Reconciliation {
        agreement,
        weighted_mean: Some(weighted_mean),
    }
}

fn sorted_tail(points: &[ForecastPoint]) -> Vec<f64> {
    let mut ordered: Vec<&ForecastPoint> = points.iter().collect();
    ordered.sort_by_key(|p| p.ts);
    let start = ordered.len().saturating_sub(TAIL);
    ordered[start..].iter().map(|p| p.value).collect()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn points(values: &[f64]) -> Vec<ForecastPoint> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| ForecastPoint::point(base + chrono::Duration::hours(i as i64), v))
            .collect()
    }

    #[test]
    fn convergent_up_when_both_rise() {
        let result = combine(&points(&[100.0, 102.0, 104.0]), &points(&[99.0, 100.0, 101.0]));
        assert_eq!(result.agreement, Agreement::ConvergentUp);
        // 0.6 * 102 + 0.4 * 100 = 101.2
        assert_eq!(result.weighted_mean, Some(101.2));
    }

    #[test]
    fn convergent_down_when_both_fall() {
        let result = combine(&points(&[104.0, 102.0, 100.0]), &points(&[101.0, 100.0, 99.0]));
        assert_eq!(result.agreement, Agreement::ConvergentDown);
    }

    #[test]
    fn divergent_when_models_disagree() {
        let result = combine(&points(&[100.0, 102.0, 104.0]), &points(&[101.0, 100.0, 99.0]));
        assert_eq!(result.agreement, Agreement::Divergent);
        assert!(result.weighted_mean.is_some());
    }

    #[test]
    fn empty_side_is_sentinel_absence() {
        let result = combine(&[], &points(&[100.0, 101.0]));
        assert_eq!(result.agreement, Agreement::Insufficient);
        assert_eq!(result.weighted_mean, None);

        let result = combine(&points(&[100.0, 101.0]), &[]);
        assert_eq!(result.weighted_mean, None);
    }

    #[test]
    fn longer_input_uses_last_three() {
        // First two points would flip the classification if counted.
        let result = combine(
            &points(&[500.0, 400.0, 100.0, 102.0, 104.0]),
            &points(&[99.0, 100.0, 101.0]),
        );
        assert_eq!(result.agreement, Agreement::ConvergentUp);
    }

    #[test]
    fn call_order_does_not_matter() {
        let seq = points(&[100.0, 102.0, 104.0]);
        let cls = points(&[99.0, 100.0, 101.0]);

        let mut seq_shuffled = seq.clone();
        seq_shuffled.swap(0, 2);
        let mut cls_shuffled = cls.clone();
        cls_shuffled.swap(0, 1);

        assert_eq!(combine(&seq, &cls), combine(&seq_shuffled, &cls_shuffled));
    }

    #[test]
    fn labels_carry_glyphs() {
        assert!(Agreement::ConvergentUp.label().contains("convergent-up"));
        assert!(Agreement::Insufficient.label().contains("insufficient"));
    }
}
