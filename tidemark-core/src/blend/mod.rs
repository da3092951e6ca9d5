//! Forecast blending — reconciliation, sentiment, and adaptive scoring.

pub mod microtrend;
pub mod reconcile;
pub mod scorer;
pub mod sentiment;

pub use microtrend::{microtrend, Microtrend, MicrotrendDirection};
pub use reconcile::{combine, Agreement, Reconciliation};
pub use scorer::{adaptive_score, direction_score};
pub use sentiment::{read_indicators, sentiment_score, IndicatorReading, Lean};
