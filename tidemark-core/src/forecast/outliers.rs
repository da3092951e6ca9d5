//! Outlier trimming for the classical fit.
//!
//! Points beyond the z-score cutoff are dropped only when at least two
//! points survive; otherwise the full series is kept and a data-quality
//! warning is attached for the caller.

use chrono::NaiveDateTime;

/// Result of a trim pass.
#[derive(Debug, Clone)]
pub struct TrimOutcome {
    pub points: Vec<(NaiveDateTime, f64)>,
    pub warning: Option<String>,
}

/// Drop |z| >= cutoff observations, keeping the series intact when the trim
/// would leave fewer than two points.
pub fn trim_zscore(points: Vec<(NaiveDateTime, f64)>, cutoff: f64) -> TrimOutcome {
    let n = points.len();
    if n < 2 {
        return TrimOutcome {
            points,
            warning: None,
        };
    }

    let mean = points.iter().map(|p| p.1).sum::<f64>() / n as f64;
    let var = points.iter().map(|p| (p.1 - mean).powi(2)).sum::<f64>() / n as f64;
    let std = var.sqrt();
    if std <= 0.0 {
        return TrimOutcome {
            points,
            warning: None,
        };
    }

    let kept: Vec<(NaiveDateTime, f64)> = points
        .iter()
        .copied()
        .filter(|p| ((p.1 - mean) / std).abs() < cutoff)
        .collect();

    if kept.len() >= 2 {
        TrimOutcome {
            points: kept,
            warning: None,
        }
    } else {
        TrimOutcome {
            points,
            warning: Some("outlier trim would leave too few points; using full series".into()),
        }
    }
}
