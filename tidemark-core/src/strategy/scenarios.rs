//! Alternative scenarios — best-effort qualitative overlays.
//!
//! Scenarios arrive as text records (trigger and target as currency
//! strings). Parsing is defensive: an unparsable price silently disables
//! the overlay for that record, never the recommendation.

use serde::{Deserialize, Serialize};

use crate::domain::round2;

/// Directional kind recognized from the scenario label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScenarioKind {
    Breakout,
    Breakdown,
}

/// One qualitative scenario record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub label: String,
    pub trigger: String,
    pub target: String,
    pub comment: String,
}

impl Scenario {
    pub fn kind(&self) -> Option<ScenarioKind> {
        let label = self.label.to_lowercase();
        if label.contains("breakout") {
            Some(ScenarioKind::Breakout)
        } else if label.contains("breakdown") {
            Some(ScenarioKind::Breakdown)
        } else {
            None
        }
    }

    pub fn trigger_price(&self) -> Option<f64> {
        parse_currency(&self.trigger)
    }

    pub fn target_price(&self) -> Option<f64> {
        parse_currency(&self.target)
    }
}

/// Parse a currency string ("$ 103.50", "US$ 1.234,56") into a number.
/// Returns `None` for anything that does not reduce to a plain number.
pub fn parse_currency(text: &str) -> Option<f64> {
    let mut cleaned = text.trim().to_string();
    for symbol in ["US$", "R$", "$"] {
        cleaned = cleaned.replace(symbol, "");
    }
    // Decimal-comma inputs ("1.234,56") carry dots as thousands separators.
    if cleaned.contains(',') {
        cleaned = cleaned.replace('.', "").replace(',', ".");
    }
    cleaned.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// The standard scenario pair around the current price: a moderate breakout
/// and an accelerated breakdown, with formatted trigger/target prices.
pub fn alternative_scenarios(price: f64) -> Vec<Scenario> {
    let breakout_trigger = round2(price * 1.015);
    let breakout_target = round2(price * 1.05);
    let breakdown_trigger = round2(price * 0.985);
    let breakdown_target = round2(price * 0.94);

    vec![
        Scenario {
            label: "moderate breakout".into(),
            trigger: format!("$ {breakout_trigger:.2}"),
            target: format!("$ {breakout_target:.2}"),
            comment: "validates the reversal".into(),
        },
        Scenario {
            label: "accelerated breakdown".into(),
            trigger: format!("$ {breakdown_trigger:.2}"),
            target: format!("$ {breakdown_target:.2}"),
            comment: "pressures the support".into(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_currency() {
        assert_eq!(parse_currency("$ 103.50"), Some(103.5));
        assert_eq!(parse_currency("US$ 9.99"), Some(9.99));
        assert_eq!(parse_currency("  12.00 "), Some(12.0));
    }

    #[test]
    fn parses_decimal_comma() {
        assert_eq!(parse_currency("R$ 1.234,56"), Some(1234.56));
        assert_eq!(parse_currency("R$ 12,34"), Some(12.34));
    }

    #[test]
    fn malformed_input_is_none() {
        assert_eq!(parse_currency("break above $ resistance"), None);
        assert_eq!(parse_currency(""), None);
        assert_eq!(parse_currency("$$"), None);
    }

    #[test]
    fn standard_pair_shapes() {
        let scenarios = alternative_scenarios(100.0);
        assert_eq!(scenarios.len(), 2);
        assert_eq!(scenarios[0].kind(), Some(ScenarioKind::Breakout));
        assert_eq!(scenarios[1].kind(), Some(ScenarioKind::Breakdown));
        assert_eq!(scenarios[0].trigger_price(), Some(101.5));
        assert_eq!(scenarios[0].target_price(), Some(105.0));
        assert_eq!(scenarios[1].trigger_price(), Some(98.5));
        assert_eq!(scenarios[1].target_price(), Some(94.0));
    }

    #[test]
    fn unknown_label_has_no_kind() {
        let s = Scenario {
            label: "sideways chop".into(),
            trigger: "$ 1.00".into(),
            target: "$ 2.00".into(),
            comment: String::new(),
        };
        assert_eq!(s.kind(), None);
    }
}
