//! Short-horizon microtrend from the sequence model's first few steps.

use serde::{Deserialize, Serialize};

use crate::domain::{round3, ForecastPoint};

const SAMPLE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MicrotrendDirection {
    Rising,
    Falling,
    Flat,
}

/// Near-term projection relative to the current price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Microtrend {
    pub direction: MicrotrendDirection,
    /// Mean of the sampled points minus the current price, to 3 decimals.
    pub delta: f64,
}

impl Microtrend {
    pub fn phrase(&self, price: f64) -> String {
        match self.direction {
            MicrotrendDirection::Rising if self.delta.abs() < 0.01 => {
                format!("slight upward drift forming from {price:.2}")
            }
            MicrotrendDirection::Falling if self.delta.abs() < 0.01 => {
                format!("slight downward drift forming from {price:.2}")
            }
            MicrotrendDirection::Flat => {
                format!("holding near {price:.2} with no clear move ahead")
            }
            MicrotrendDirection::Rising => {
                format!("projecting up to +{:.2} from {price:.2} over the next candles", self.delta)
            }
            MicrotrendDirection::Falling => {
                format!(
                    "projecting down by {:.2} from {price:.2} over the next candles",
                    self.delta.abs()
                )
            }
        }
    }
}

/// Microtrend over the first ≤3 forecast points against the current price.
///
/// `None` when there are no points or the price is degenerate (< 0.01).
pub fn microtrend(points: &[ForecastPoint], price: f64) -> Option<Microtrend> {
    if points.is_empty() || !price.is_finite() || price < 0.01 {
        return None;
    }

    let sampled: Vec<f64> = points.iter().take(SAMPLE).map(|p| p.value).collect();
    let mean = sampled.iter().sum::<f64>() / sampled.len() as f64;
    let delta = round3(mean - price);

    let first = sampled[0];
    let last = sampled[sampled.len() - 1];
    let direction = if first < last {
        MicrotrendDirection::Rising
    } else if first > last {
        MicrotrendDirection::Falling
    } else {
        MicrotrendDirection::Flat
    };

    Some(Microtrend { direction, delta })
}
