//! Tidemark Core — forecast blending and adaptive strategy scoring.
//!
//! This crate contains the heart of the signal engine:
//! - Domain types (candles, timeframes, trajectories, recommendations)
//! - Indicator engine with timeframe-gated snapshots
//! - Classical forecaster adapter (trend/seasonality model, outlier
//!   trimming, adaptive flexibility search, volatility-band anchoring)
//! - Sequence forecaster adapter (recurrent network, artifact caching,
//!   clamped autoregressive rollout)
//! - Model reconciliation, indicator sentiment, and the adaptive scorer
//! - Strategy selector with rigorous/simple decision tables and
//!   volatility-derived target/stop ladders
//! - The synchronous analysis pipeline tying the stages together

pub mod blend;
pub mod config;
pub mod data;
pub mod domain;
pub mod forecast;
pub mod indicators;
pub mod pipeline;
pub mod strategy;
