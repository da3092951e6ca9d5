//! Strategy selection — decision tables over indicator state, target/stop
//! derivation from volatility and model consensus, and confidence grading.

pub mod confidence;
pub mod levels;
pub mod reversal;
pub mod scenarios;
pub mod selector;

pub use confidence::grade;
pub use levels::{compute_levels, LevelInputs};
pub use reversal::{bearish_reversal, bullish_reversal};
pub use scenarios::{alternative_scenarios, parse_currency, Scenario, ScenarioKind};
pub use selector::{select, StrategyInputs};
