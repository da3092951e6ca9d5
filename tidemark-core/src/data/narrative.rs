//! Narrative generation seam.
//!
//! The rationale text may come from an external text-completion service.
//! Its output is treated as an unstructured document: sections are
//! recognized by labeled markers, and a missing marker yields an explicit
//! absent section — never positional indexing that silently shifts on
//! malformed input. `TemplateNarrative` is the deterministic built-in
//! implementation rendered from the structured report.

use serde::{Deserialize, Serialize};

use crate::domain::Direction;
use crate::pipeline::AnalysisReport;

use super::provider::DataError;

/// Produces the free-text analysis narrative for a report.
pub trait NarrativeGenerator: Send + Sync {
    fn generate(&self, report: &AnalysisReport) -> Result<String, DataError>;
}

/// The fixed topical sections of a narrative. `None` marks a section the
/// generator did not produce.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NarrativeSections {
    pub overview: Option<String>,
    pub trend: Option<String>,
    pub levels: Option<String>,
    pub projection: Option<String>,
    pub scenarios: Option<String>,
    pub conclusion: Option<String>,
}

const SECTION_LABELS: [&str; 6] = [
    "overview",
    "trend",
    "levels",
    "projection",
    "scenarios",
    "conclusion",
];

impl NarrativeSections {
    /// Parse labeled sections out of free text. Unlabeled or short output
    /// leaves every unmatched section absent.
    pub fn parse(text: &str) -> Self {
        let mut sections = Self::default();
        let mut current: Option<usize> = None;
        let mut buffers: Vec<String> = vec![String::new(); SECTION_LABELS.len()];

        for line in text.lines() {
            let trimmed = line.trim();
            let lower = trimmed.to_lowercase();
            let mut matched = false;
            for (idx, label) in SECTION_LABELS.iter().enumerate() {
                if let Some(rest) = lower.strip_prefix(label) {
                    if let Some(rest) = rest.strip_prefix(':') {
                        current = Some(idx);
                        let offset = trimmed.len() - rest.len();
                        let content = trimmed[offset..].trim();
                        if !content.is_empty() {
                            buffers[idx].push_str(content);
                        }
                        matched = true;
                        break;
                    }
                }
            }
            if matched {
                continue;
            }
            if let Some(idx) = current {
                if !trimmed.is_empty() {
                    if !buffers[idx].is_empty() {
                        buffers[idx].push(' ');
                    }
                    buffers[idx].push_str(trimmed);
                }
            }
        }

        let mut take = |idx: usize| {
            let text = std::mem::take(&mut buffers[idx]);
            (!text.is_empty()).then_some(text)
        };
        sections.overview = take(0);
        sections.trend = take(1);
        sections.levels = take(2);
        sections.projection = take(3);
        sections.scenarios = take(4);
        sections.conclusion = take(5);
        sections
    }
}

/// Comment on the consensus value's proximity to a retracement level
/// (within half a unit).
pub fn confluence_comment(weighted_mean: Option<f64>, fibonacci: &[(String, f64)]) -> String {
    let Some(mean) = weighted_mean.filter(|v| v.is_finite()) else {
        return "no consensus value available for retracement comparison".into();
    };
    for (label, price) in fibonacci {
        if (mean - price).abs() <= 0.5 {
            return format!(
                "consensus coincides with the {label} retracement ({price:.2}) — likely support or resistance"
            );
        }
    }
    "consensus sits outside the critical retracement zones".into()
}

/// Deterministic narrative rendered from the structured report.
#[derive(Debug, Default)]
pub struct TemplateNarrative;

impl NarrativeGenerator for TemplateNarrative {
    fn generate(&self, report: &AnalysisReport) -> Result<String, DataError> {
        let rec = &report.recommendation;
        let direction = match rec.direction {
            Direction::Long => "a long setup",
            Direction::Short => "a short setup",
            Direction::Neutral => "no actionable setup",
        };

        let trend = report
            .readings
            .iter()
            .map(|r| r.summary.as_str())
            .collect::<Vec<_>>()
            .join("; ");

        let levels = match &rec.levels {
            Some(l) => format!(
                "entry {:.2}, targets {:.2} / {:.2} / {:.2}, stop {:.2}",
                rec.entry, l.tp1, l.tp2, l.tp3, l.stop
            ),
            None => "no levels for a neutral call".into(),
        };

        let projection = match &report.microtrend {
            Some(m) => m.phrase(report.price),
            None => "no short-horizon projection available".into(),
        };

        let scenarios = report
            .scenarios
            .iter()
            .map(|s| format!("{}: trigger {}, target {}", s.label, s.trigger, s.target))
            .collect::<Vec<_>>()
            .join("; ");

        let conclusion = format!(
            "{} — {} (confidence {:?}, score {:+.2}); {}",
            direction,
            rec.rationale,
            rec.confidence,
            report.score,
            confluence_comment(report.reconciliation.weighted_mean, &report.fibonacci),
        );

        Ok(format!(
            "overview: {} on {} over {} at {:.2}\n\
             trend: {}\n\
             levels: {}\n\
             projection: {}\n\
             scenarios: {}\n\
             conclusion: {}\n",
            report.ticker, report.timeframe, report.period, report.price,
            trend, levels, projection, scenarios, conclusion,
        ))
    }
}
