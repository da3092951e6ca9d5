//! Indicator snapshot — the validated, gap-free bundle of derived columns.
//!
//! A snapshot exists only when the series clears the timeframe's minimum
//! candle count; otherwise `compute` returns a typed insufficiency and
//! downstream stages refuse to proceed. Derived columns are interpolated and
//! edge-filled after computation because consumers index the last row
//! unconditionally.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{bollinger_bands, macd, rsi, sma, volume_sma};
use crate::domain::{CandleSeries, Timeframe};

const SHORT_WINDOW: usize = 20;
const LONG_WINDOW: usize = 50;
const RSI_WINDOW: usize = 14;
const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;
const MACD_SIGNAL: usize = 9;
const VOLUME_WINDOW: usize = 21;
const BAND_WIDTH: f64 = 2.0;

/// Why a snapshot could not be produced. Recoverable by contract: callers
/// branch to a neutral/fallback path rather than failing the request.
#[derive(Debug, Error)]
pub enum IndicatorError {
    #[error("insufficient candles: have {have}, need {need} for {timeframe}")]
    Insufficient {
        have: usize,
        need: usize,
        timeframe: Timeframe,
    },

    #[error("close column has no finite values")]
    NoCloseData,
}

/// Scalars from the most recent snapshot row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SnapshotRow {
    pub ts: NaiveDateTime,
    pub close: f64,
    pub sma20: f64,
    pub sma50: f64,
    pub std20: f64,
    pub upper_band: f64,
    pub lower_band: f64,
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub volume_sma: Option<f64>,
}

/// Full-length derived columns aligned with the (close-valid) candles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub ts: Vec<NaiveDateTime>,
    pub close: Vec<f64>,
    pub sma20: Vec<f64>,
    pub sma50: Vec<f64>,
    pub std20: Vec<f64>,
    pub upper_band: Vec<f64>,
    pub lower_band: Vec<f64>,
    pub rsi: Vec<f64>,
    pub macd: Vec<f64>,
    pub macd_signal: Vec<f64>,
    pub volume_sma: Vec<f64>,
}

impl IndicatorSnapshot {
    /// Compute the snapshot, or report a typed insufficiency.
    pub fn compute(
        series: &CandleSeries,
        timeframe: Timeframe,
    ) -> Result<Self, IndicatorError> {
        let need = timeframe.min_candles();
        if series.len() < need {
            return Err(IndicatorError::Insufficient {
                have: series.len(),
                need,
                timeframe,
            });
        }
        if !series.candles().iter().any(|c| c.close.is_finite()) {
            return Err(IndicatorError::NoCloseData);
        }

        // Rows without a finite close are dropped; derived gaps are filled.
        let kept: Vec<_> = series
            .candles()
            .iter()
            .filter(|c| c.close.is_finite())
            .collect();
        let ts: Vec<NaiveDateTime> = kept.iter().map(|c| c.ts).collect();
        let close: Vec<f64> = kept.iter().map(|c| c.close).collect();
        let volumes: Vec<Option<f64>> = kept.iter().map(|c| c.volume).collect();

        let (sma20, std20, upper_band, lower_band) =
            bollinger_bands(&close, SHORT_WINDOW, BAND_WIDTH);
        let sma50 = sma(&close, LONG_WINDOW);
        let rsi_col = rsi(&close, RSI_WINDOW);
        let (macd_col, macd_signal_col) = macd(&close, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
        let volume_col = volume_sma(&volumes, VOLUME_WINDOW);

        let mut snapshot = Self {
            ts,
            close,
            sma20,
            sma50,
            std20,
            upper_band,
            lower_band,
            rsi: rsi_col,
            macd: macd_col,
            macd_signal: macd_signal_col,
            volume_sma: volume_col,
        };
        for column in [
            &mut snapshot.sma20,
            &mut snapshot.sma50,
            &mut snapshot.std20,
            &mut snapshot.upper_band,
            &mut snapshot.lower_band,
            &mut snapshot.rsi,
            &mut snapshot.macd,
            &mut snapshot.macd_signal,
            &mut snapshot.volume_sma,
        ] {
            interpolate_fill(column);
        }

        Ok(snapshot)
    }

    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    /// Scalars of the most recent row. Safe because `compute` rejects empty
    /// input, so a constructed snapshot always has at least one row.
    pub fn last(&self) -> SnapshotRow {
        let i = self.close.len() - 1;
        SnapshotRow {
            ts: self.ts[i],
            close: self.close[i],
            sma20: self.sma20[i],
            sma50: self.sma50[i],
            std20: self.std20[i],
            upper_band: self.upper_band[i],
            lower_band: self.lower_band[i],
            rsi: self.rsi[i],
            macd: self.macd[i],
            macd_signal: self.macd_signal[i],
            volume_sma: self.volume_sma[i].is_finite().then_some(self.volume_sma[i]),
        }
    }
}

/// Linear interpolation of interior NaN runs (bounded at the series edges),
/// then forward fill, then backward fill. An all-NaN column stays NaN —
/// there is nothing to anchor a fill to.
fn interpolate_fill(column: &mut [f64]) {
    let n = column.len();

    // Interior interpolation between finite neighbors.
    let mut i = 0;
    while i < n {
        if column[i].is_nan() {
            let run_start = i;
            let mut run_end = i;
            while run_end + 1 < n && column[run_end + 1].is_nan() {
                run_end += 1;
            }
            let left = run_start.checked_sub(1).map(|j| column[j]).filter(|v| v.is_finite());
            let right = (run_end + 1 < n).then(|| column[run_end + 1]).filter(|v| v.is_finite());
            if let (Some(a), Some(b)) = (left, right) {
                let span = (run_end - run_start + 2) as f64;
                for (k, slot) in (run_start..=run_end).enumerate() {
                    let t = (k + 1) as f64 / span;
                    column[slot] = a + (b - a) * t;
                }
            }
            i = run_end + 1;
        } else {
            i += 1;
        }
    }

    // Forward fill, then backward fill the remaining edges.
    let mut last_valid = f64::NAN;
    for v in column.iter_mut() {
        if v.is_finite() {
            last_valid = *v;
        } else if last_valid.is_finite() {
            *v = last_valid;
        }
    }
    let mut next_valid = f64::NAN;
    for v in column.iter_mut().rev() {
        if v.is_finite() {
            next_valid = *v;
        } else if next_valid.is_finite() {
            *v = next_valid;
        }
    }
}
