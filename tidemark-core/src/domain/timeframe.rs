//! Timeframe — candle interval granularity.
//!
//! Each timeframe carries its indicator warmup minimum and the forecast step
//! grid used by the classical adapter (steps emitted per requested horizon
//! unit, and the native step size of those steps).

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Timeframe {
    #[serde(rename = "15min")]
    M15,
    #[serde(rename = "30min")]
    M30,
    #[serde(rename = "45min")]
    M45,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "2h")]
    H2,
    #[serde(rename = "6h")]
    H6,
    #[serde(rename = "1d")]
    D1,
    #[serde(rename = "1wk")]
    W1,
    #[serde(rename = "1mo")]
    Mo1,
}

impl Timeframe {
    pub const ALL: [Timeframe; 9] = [
        Timeframe::M15,
        Timeframe::M30,
        Timeframe::M45,
        Timeframe::H1,
        Timeframe::H2,
        Timeframe::H6,
        Timeframe::D1,
        Timeframe::W1,
        Timeframe::Mo1,
    ];

    /// Minimum candle count required for a valid indicator snapshot.
    ///
    /// Very short intraday frames need fewer candles than the daily frame,
    /// which must cover the 52-candle envelope of the slow average.
    pub fn min_candles(&self) -> usize {
        match self {
            Timeframe::M15 => 20,
            Timeframe::M30 => 25,
            Timeframe::M45 => 30,
            Timeframe::H1 => 35,
            Timeframe::H2 => 30,
            Timeframe::H6 => 30,
            Timeframe::D1 => 52,
            Timeframe::W1 => 30,
            Timeframe::Mo1 => 30,
        }
    }

    /// Forecast grid: (steps per requested horizon unit, native step size).
    pub fn forecast_grid(&self) -> (usize, Duration) {
        match self {
            Timeframe::M15 => (4, Duration::minutes(15)),
            Timeframe::M30 => (4, Duration::minutes(30)),
            Timeframe::M45 => (4, Duration::minutes(45)),
            Timeframe::H1 => (6, Duration::hours(1)),
            Timeframe::H2 => (6, Duration::hours(2)),
            Timeframe::H6 => (4, Duration::hours(6)),
            Timeframe::D1 => (7, Duration::days(1)),
            Timeframe::W1 => (4, Duration::days(7)),
            Timeframe::Mo1 => (3, Duration::days(30)),
        }
    }

    /// Default grid when neither the declared nor the inferred frequency is
    /// recognized: six one-hour steps per horizon unit.
    pub fn default_grid() -> (usize, Duration) {
        (6, Duration::hours(1))
    }

    /// Recognize a timeframe from an observed candle step size.
    pub fn infer(step: Duration) -> Option<Timeframe> {
        Timeframe::ALL
            .iter()
            .copied()
            .find(|tf| tf.forecast_grid().1 == step)
    }

    pub fn is_intraday(&self) -> bool {
        matches!(
            self,
            Timeframe::M15
                | Timeframe::M30
                | Timeframe::M45
                | Timeframe::H1
                | Timeframe::H2
                | Timeframe::H6
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M15 => "15min",
            Timeframe::M30 => "30min",
            Timeframe::M45 => "45min",
            Timeframe::H1 => "1h",
            Timeframe::H2 => "2h",
            Timeframe::H6 => "6h",
            Timeframe::D1 => "1d",
            Timeframe::W1 => "1wk",
            Timeframe::Mo1 => "1mo",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "15min" | "15m" => Ok(Timeframe::M15),
            "30min" | "30m" => Ok(Timeframe::M30),
            "45min" | "45m" => Ok(Timeframe::M45),
            "1h" | "60min" => Ok(Timeframe::H1),
            "2h" => Ok(Timeframe::H2),
            "6h" => Ok(Timeframe::H6),
            "1d" | "1day" => Ok(Timeframe::D1),
            "1wk" | "1w" => Ok(Timeframe::W1),
            "1mo" | "1month" => Ok(Timeframe::Mo1),
            other => Err(format!("unrecognized timeframe '{other}'")),
        }
    }
}
