//! Indicator sentiment — qualitative readings of the latest snapshot row,
//! each leaning bullish, bearish, or neutral. The summed lean is the
//! sentiment input to the adaptive scorer.

use serde::{Deserialize, Serialize};

use crate::indicators::SnapshotRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lean {
    Bullish,
    Bearish,
    Neutral,
}

impl Lean {
    pub fn score(&self) -> i32 {
        match self {
            Lean::Bullish => 1,
            Lean::Bearish => -1,
            Lean::Neutral => 0,
        }
    }
}

/// One qualitative interpretation of the current technical picture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorReading {
    pub summary: String,
    pub lean: Lean,
}

impl IndicatorReading {
    fn new(lean: Lean, summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            lean,
        }
    }
}

/// Interpret the latest row: oscillator zone, price vs the short average,
/// and band proximity (the band reading only appears at or beyond a band).
pub fn read_indicators(row: &SnapshotRow) -> Vec<IndicatorReading> {
    let mut readings = Vec::new();

    if row.rsi < 35.0 {
        readings.push(IndicatorReading::new(
            Lean::Bullish,
            format!("RSI at {:.0}: entering a discount zone", row.rsi),
        ));
    } else if row.rsi > 65.0 {
        readings.push(IndicatorReading::new(
            Lean::Bearish,
            format!("RSI at {:.0}: approaching overbought territory", row.rsi),
        ));
    } else {
        readings.push(IndicatorReading::new(
            Lean::Neutral,
            format!("RSI at {:.0}: no clear pressure either way", row.rsi),
        ));
    }

    if row.close < row.sma20 {
        readings.push(IndicatorReading::new(
            Lean::Bearish,
            "price below the 20-period average: short-term weakness",
        ));
    } else {
        readings.push(IndicatorReading::new(
            Lean::Bullish,
            "price above the 20-period average: short-term strength",
        ));
    }

    if row.close <= row.lower_band {
        readings.push(IndicatorReading::new(
            Lean::Bullish,
            "price at the lower volatility band: possible floor",
        ));
    } else if row.close >= row.upper_band {
        readings.push(IndicatorReading::new(
            Lean::Bearish,
            "price at the upper volatility band: stretched",
        ));
    }

    readings
}

/// Sum of leans: +1 per bullish reading, −1 per bearish.
pub fn sentiment_score(readings: &[IndicatorReading]) -> i32 {
    readings.iter().map(|r| r.lean.score()).sum()
}
