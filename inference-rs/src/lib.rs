//! Posterior price-range forecasting for a twice-daily price series.
//!
//! A cycle has 14 slots: the base price (stored twice) and 12 half-day sell
//! prices. Prices follow one of four hidden [`Pattern`]s; given the prices
//! observed so far, [`Predictor::analyze`] returns the posterior probability
//! of each pattern and the price bounds every open slot can still take.

pub mod analysis;
pub mod error;
pub mod math;
pub mod pattern;
pub mod pdf;
pub mod phases;
pub mod predictor;
pub mod week;

pub use analysis::{AnalysisResult, PatternSummary, PriceRange, SlotBounds, Totals, Trajectory};
pub use error::PredictionError;
pub use pattern::Pattern;
pub use pdf::ProbabilityDensityFunction;
pub use predictor::{Predictor, PredictorConfig};
pub use week::{week_number, HalfDay, WeekPrices};

/// Slots per cycle.
pub const SLOT_COUNT: usize = 14;

/// Observed prices for a cycle; `None` marks an unknown slot.
pub type Slots = [Option<u32>; SLOT_COUNT];

/// Library-wide result type.
pub type Result<T> = std::result::Result<T, PredictionError>;

/// Analyze one cycle with the default configuration.
pub fn analyze(
    prices: Slots,
    first_cycle: bool,
    previous_pattern: Option<Pattern>,
) -> Result<AnalysisResult> {
    Predictor::new(prices, first_cycle, previous_pattern)?.analyze()
}
