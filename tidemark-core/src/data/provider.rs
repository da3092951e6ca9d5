//! Candle supply and persistence traits with structured error types.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use thiserror::Error;

use crate::domain::{
    CandleSeries, Confidence, Direction, TargetLevels, Ticker, Timeframe,
};

/// Structured errors for collaborator operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("symbol not found: {ticker}")]
    SymbolNotFound { ticker: String },

    #[error("empty series for '{ticker}'")]
    EmptySeries { ticker: String },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("narrative generation failed: {0}")]
    Narrative(String),
}

/// Supplies OHLCV candles for a symbol/interval/period, or fails.
///
/// Empty series and missing closes are first-class outcomes the core
/// handles; implementations should reserve errors for transport-level
/// failures.
pub trait CandleProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    fn fetch(
        &self,
        ticker: &str,
        timeframe: Timeframe,
        period: &str,
    ) -> Result<CandleSeries, DataError>;
}

/// One persisted recommendation, written after the core computes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRecord {
    pub ticker: Ticker,
    pub created_at: NaiveDateTime,
    pub timeframe: Timeframe,
    pub period: String,
    pub direction: Direction,
    pub entry: f64,
    pub levels: Option<TargetLevels>,
    pub confidence: Confidence,
    pub score: f64,
}

/// Side-effecting persistence of past recommendations.
pub trait RecommendationStore: Send + Sync {
    fn save(&self, record: &RecommendationRecord) -> Result<(), DataError>;

    fn list_recent(
        &self,
        ticker: &str,
        limit: usize,
    ) -> Result<Vec<RecommendationRecord>, DataError>;
}

/// In-memory store, for tests and single-process runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<RecommendationRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecommendationStore for MemoryStore {
    fn save(&self, record: &RecommendationRecord) -> Result<(), DataError> {
        self.records
            .lock()
            .map_err(|e| DataError::Storage(e.to_string()))?
            .push(record.clone());
        Ok(())
    }

    fn list_recent(
        &self,
        ticker: &str,
        limit: usize,
    ) -> Result<Vec<RecommendationRecord>, DataError> {
        let records = self
            .records
            .lock()
            .map_err(|e| DataError::Storage(e.to_string()))?;
        Ok(records
            .iter()
            .rev()
            .filter(|r| r.ticker == ticker)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(ticker: &str, entry: f64) -> RecommendationRecord {
        RecommendationRecord {
            ticker: ticker.into(),
            created_at: NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            timeframe: Timeframe::D1,
            period: "5d".into(),
            direction: Direction::Long,
            entry,
            levels: None,
            confidence: Confidence::Medium,
            score: 0.4,
        }
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new();
        store.save(&record("SOL-USD", 100.0)).unwrap();
        store.save(&record("SOL-USD", 101.0)).unwrap();
        store.save(&record("BTC-USD", 40000.0)).unwrap();

        let recent = store.list_recent("SOL-USD", 10).unwrap();
        assert_eq!(recent.len(), 2);
        // Most recent first.
        assert_eq!(recent[0].entry, 101.0);
    }

    #[test]
    fn list_respects_limit() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store.save(&record("SOL-USD", 100.0 + i as f64)).unwrap();
        }
        assert_eq!(store.list_recent("SOL-USD", 2).unwrap().len(), 2);
    }

    #[test]
    fn unknown_ticker_is_empty_not_error() {
        let store = MemoryStore::new();
        assert!(store.list_recent("NONE", 5).unwrap().is_empty());
    }
}
