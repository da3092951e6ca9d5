//! Candle — the fundamental market data unit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// OHLCV candle for a single symbol in a single time bucket.
///
/// `volume` is `None` when the feed reported nothing usable. A reported
/// volume of zero is normalized to `None` at series construction — rolling
/// volume statistics must treat it as missing, not as a real zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub ts: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
}

impl Candle {
    /// Returns true if any OHLC field is NaN (void candle).
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: high >= low, high bounds open/close, positive prices.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }
}

/// Structured errors for candle series construction.
#[derive(Debug, Error)]
pub enum CandleError {
    #[error("timestamps must be strictly increasing (violation at index {index})")]
    NonMonotonicTimestamp { index: usize },

    #[error("duplicate timestamp at index {index}")]
    DuplicateTimestamp { index: usize },
}

/// An ordered candle series with validated timestamps.
///
/// Construction enforces strictly increasing timestamps with no duplicates,
/// and normalizes zero volume to absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new(mut candles: Vec<Candle>) -> Result<Self, CandleError> {
        for i in 1..candles.len() {
            if candles[i].ts < candles[i - 1].ts {
                return Err(CandleError::NonMonotonicTimestamp { index: i });
            }
            if candles[i].ts == candles[i - 1].ts {
                return Err(CandleError::DuplicateTimestamp { index: i });
            }
        }
        for candle in &mut candles {
            if candle.volume == Some(0.0) {
                candle.volume = None;
            }
        }
        Ok(Self { candles })
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// Last close price, if the series has any candle with a finite close.
    pub fn last_close(&self) -> Option<f64> {
        self.candles
            .iter()
            .rev()
            .map(|c| c.close)
            .find(|c| c.is_finite())
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn volumes(&self) -> Vec<Option<f64>> {
        self.candles.iter().map(|c| c.volume).collect()
    }

    /// Modal timestamp delta between consecutive candles.
    ///
    /// Used to infer the native step size when the caller did not declare a
    /// timeframe. `None` for series shorter than two candles.
    pub fn step(&self) -> Option<chrono::Duration> {
        if self.candles.len() < 2 {
            return None;
        }
        let mut counts: HashMap<i64, usize> = HashMap::new();
        for pair in self.candles.windows(2) {
            let delta = (pair[1].ts - pair[0].ts).num_seconds();
            *counts.entry(delta).or_insert(0) += 1;
        }
        counts
            .into_iter()
            .max_by_key(|&(delta, count)| (count, std::cmp::Reverse(delta)))
            .map(|(delta, _)| chrono::Duration::seconds(delta))
    }
}
