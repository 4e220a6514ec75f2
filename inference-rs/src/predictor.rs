//! Posterior pattern and price-range inference.
//!
//! Provides the main [`Predictor`], which enumerates every way each pattern
//! could split the 12 half-day slots into phases, scores each split against
//! the observed prices, and aggregates the survivors into an
//! [`AnalysisResult`].

use crate::analysis::{AnalysisResult, PriceRange, SlotBounds, Trajectory};
use crate::error::PredictionError;
use crate::pattern::Pattern;
use crate::phases::PhaseContext;
use crate::{Result, Slots, SLOT_COUNT};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Number of half-day slots after the two base-price slots.
pub const PHASE_SLOTS: usize = SLOT_COUNT - 2;

/// Single-slot rate ranges for a large spike, starting at its first rising slot.
const LARGE_SPIKE_MIN_RATES: [f64; 11] = [0.9, 1.4, 2.0, 1.4, 0.9, 0.4, 0.4, 0.4, 0.4, 0.4, 0.4];
const LARGE_SPIKE_MAX_RATES: [f64; 11] = [1.4, 2.0, 6.0, 2.0, 1.4, 0.9, 0.9, 0.9, 0.9, 0.9, 0.9];

/// Configuration for the predictor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    /// Largest mismatch (in price units) tolerated between an observation
    /// and a simulated bound before giving up
    pub max_fudge_factor: u32,

    /// Lowest base price tried when the base is unknown
    pub min_base_price: u32,

    /// Highest base price tried when the base is unknown
    pub max_base_price: u32,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            max_fudge_factor: 5,
            min_base_price: 90,
            max_base_price: 110,
        }
    }
}

/// One way to split the 12 half-day slots into a pattern's phases.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub lengths: Vec<usize>,

    /// Prior probability of this split within its pattern
    pub weight: f64,
}

/// Every phase split a pattern allows, with equal-chance weights.
pub fn partitions(pattern: Pattern) -> Vec<Partition> {
    match pattern {
        Pattern::Fluctuating => {
            let mut out = Vec::new();
            for dec_1 in 2..4 {
                for high_1 in 0..7 {
                    for high_3 in 0..(7 - high_1) {
                        out.push(Partition {
                            lengths: vec![high_1, dec_1, 7 - high_1 - high_3, 5 - dec_1, high_3],
                            weight: 1.0 / 2.0 / 7.0 / (7 - high_1) as f64,
                        });
                    }
                }
            }
            out
        }
        Pattern::LargeSpike => (3..10)
            .map(|peak_start| Partition {
                lengths: vec![peak_start - 2, SLOT_COUNT - peak_start],
                weight: 1.0 / 7.0,
            })
            .collect(),
        Pattern::Decreasing => vec![Partition {
            lengths: vec![PHASE_SLOTS],
            weight: 1.0,
        }],
        Pattern::SmallSpike => (2..10)
            .map(|peak_start| Partition {
                lengths: vec![peak_start - 2, 2, 3, SLOT_COUNT - (peak_start + 5)],
                weight: 1.0 / 8.0,
            })
            .collect(),
    }
}

fn check_partition(pattern: Pattern, lengths: &[usize]) -> Result<()> {
    let total: usize = lengths.iter().sum();
    if total != PHASE_SLOTS {
        return Err(PredictionError::PhaseLengthMismatch { pattern, total });
    }
    Ok(())
}

/// Stop simulating a path as soon as one phase rules it out.
macro_rules! prune {
    ($phase:expr) => {
        match $phase {
            Some(p) => p,
            None => return Ok(None),
        }
    };
}

/// Simulate one pattern under one phase split.
///
/// Returns the slot bounds and the likelihood of the observations, or `None`
/// if the observations rule this path out.
pub fn simulate(
    ctx: &PhaseContext<'_>,
    pattern: Pattern,
    lengths: &[usize],
) -> Result<Option<(SlotBounds, f64)>> {
    check_partition(pattern, lengths)?;

    let mut prices = [PriceRange::pinned(ctx.base_price); SLOT_COUNT];
    let mut probability = 1.0;
    let mut at = 2;

    match *lengths {
        [high_1, dec_1, high_2, dec_2, high_3] if pattern == Pattern::Fluctuating => {
            probability *= prune!(ctx.flat_random(&mut prices, at, high_1, 0.9, 1.4));
            at += high_1;
            probability *= prune!(ctx.decreasing(&mut prices, at, dec_1, 0.6, 0.8, 0.04, 0.1));
            at += dec_1;
            probability *= prune!(ctx.flat_random(&mut prices, at, high_2, 0.9, 1.4));
            at += high_2;
            probability *= prune!(ctx.decreasing(&mut prices, at, dec_2, 0.6, 0.8, 0.04, 0.1));
            at += dec_2;
            probability *= prune!(ctx.flat_random(&mut prices, at, high_3, 0.9, 1.4));
        }
        [decreasing, spike] if pattern == Pattern::LargeSpike => {
            probability *=
                prune!(ctx.decreasing(&mut prices, at, decreasing, 0.85, 0.9, 0.03, 0.05));
            at += decreasing;
            for i in 0..spike {
                probability *= prune!(ctx.flat_random(
                    &mut prices,
                    at + i,
                    1,
                    LARGE_SPIKE_MIN_RATES[i],
                    LARGE_SPIKE_MAX_RATES[i],
                ));
            }
        }
        [decreasing] if pattern == Pattern::Decreasing => {
            probability *=
                prune!(ctx.decreasing(&mut prices, at, decreasing, 0.85, 0.9, 0.03, 0.05));
        }
        [decreasing, rising, climax, tail] if pattern == Pattern::SmallSpike => {
            probability *=
                prune!(ctx.decreasing(&mut prices, at, decreasing, 0.4, 0.9, 0.03, 0.05));
            at += decreasing;
            probability *= prune!(ctx.flat_random(&mut prices, at, rising, 0.9, 1.4));
            at += rising;
            probability *= prune!(ctx.peak(&mut prices, at, 1.4, 2.0)?);
            at += climax;
            if tail > 0 {
                probability *=
                    prune!(ctx.decreasing(&mut prices, at, tail, 0.4, 0.9, 0.03, 0.05));
            }
        }
        _ => {
            return Err(PredictionError::PhaseLengthMismatch {
                pattern,
                total: lengths.iter().sum(),
            })
        }
    }

    Ok(Some((prices, probability)))
}

/// Posterior predictor for one cycle.
///
/// Holds the observed prices and the cycle's history; every call to
/// [`Predictor::analyze`] recomputes the result from scratch.
#[derive(Debug, Clone)]
pub struct Predictor {
    prices: Slots,
    first_cycle: bool,
    previous_pattern: Option<Pattern>,
    config: PredictorConfig,
}

impl Predictor {
    /// Create a predictor with the default configuration.
    ///
    /// # Arguments
    /// * `prices` - Observed prices; slots 0 and 1 both hold the base price
    /// * `first_cycle` - Whether this is the very first recorded cycle
    /// * `previous_pattern` - Last cycle's classified pattern, if known
    ///
    /// # Example
    /// ```
    /// use turnip_inference::{Predictor, SLOT_COUNT};
    ///
    /// let mut prices = [None; SLOT_COUNT];
    /// prices[0] = Some(98);
    /// prices[1] = Some(98);
    /// let result = Predictor::new(prices, false, None).unwrap().analyze().unwrap();
    /// assert!(!result.is_empty());
    /// ```
    pub fn new(prices: Slots, first_cycle: bool, previous_pattern: Option<Pattern>) -> Result<Self> {
        Self::with_config(prices, first_cycle, previous_pattern, PredictorConfig::default())
    }

    pub fn with_config(
        prices: Slots,
        first_cycle: bool,
        previous_pattern: Option<Pattern>,
        config: PredictorConfig,
    ) -> Result<Self> {
        if prices[0] == Some(0) || prices[1] == Some(0) {
            return Err(PredictionError::InvalidBasePrice);
        }
        if config.min_base_price == 0 || config.min_base_price > config.max_base_price {
            return Err(PredictionError::InvalidBasePrice);
        }
        Ok(Self {
            prices,
            first_cycle,
            previous_pattern,
            config,
        })
    }

    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    /// Run the full analysis.
    ///
    /// Tries fudge factors from 0 upward and keeps the first level at which
    /// any path survives. Returns [`AnalysisResult::empty`] if none does.
    pub fn analyze(&self) -> Result<AnalysisResult> {
        for fudge in 0..=self.config.max_fudge_factor {
            let trajectories = self.trajectories_at(fudge)?;
            if !trajectories.is_empty() {
                debug!(fudge, count = trajectories.len(), "found surviving trajectories");
                return Ok(AnalysisResult::from_trajectories(trajectories));
            }
        }
        debug!(
            max_fudge = self.config.max_fudge_factor,
            "no trajectory fits the observed prices"
        );
        Ok(AnalysisResult::empty())
    }

    /// Every surviving path at a fixed fudge factor, with unnormalized
    /// probabilities.
    pub fn trajectories_at(&self, fudge: u32) -> Result<Vec<Trajectory>> {
        let mut out = Vec::new();

        if self.first_cycle || self.prices[0].is_none() {
            for base_price in self.config.min_base_price..=self.config.max_base_price {
                let mut given = self.prices;
                given[0] = Some(base_price);
                given[1] = Some(base_price);
                if self.first_cycle {
                    // A first cycle always runs the small spike pattern.
                    self.collect_pattern(&mut out, &given, base_price, fudge, Pattern::SmallSpike, 1.0)?;
                } else {
                    self.collect_all_patterns(&mut out, &given, base_price, fudge)?;
                }
            }
        } else {
            let base_price = self.prices[0].unwrap_or_default();
            let mut given = self.prices;
            given[1] = Some(base_price);
            self.collect_all_patterns(&mut out, &given, base_price, fudge)?;
        }

        Ok(out)
    }

    fn collect_all_patterns(
        &self,
        out: &mut Vec<Trajectory>,
        given: &Slots,
        base_price: u32,
        fudge: u32,
    ) -> Result<()> {
        for pattern in Pattern::ALL {
            let weight = pattern.transition_probability(self.previous_pattern);
            self.collect_pattern(out, given, base_price, fudge, pattern, weight)?;
        }
        Ok(())
    }

    fn collect_pattern(
        &self,
        out: &mut Vec<Trajectory>,
        given: &Slots,
        base_price: u32,
        fudge: u32,
        pattern: Pattern,
        weight: f64,
    ) -> Result<()> {
        let ctx = PhaseContext::new(given, base_price, fudge);
        let before = out.len();
        for partition in partitions(pattern) {
            if let Some((prices, likelihood)) = simulate(&ctx, pattern, &partition.lengths)? {
                out.push(Trajectory::new(
                    pattern,
                    base_price,
                    partition.lengths,
                    prices,
                    likelihood * partition.weight * weight,
                ));
            }
        }
        trace!(%pattern, base_price, fudge, survivors = out.len() - before, "simulated pattern");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn week(base: Option<u32>, observed: &[(usize, u32)]) -> Slots {
        let mut prices = [None; SLOT_COUNT];
        prices[0] = base;
        prices[1] = base;
        for &(slot, price) in observed {
            prices[slot] = Some(price);
        }
        prices
    }

    fn total_probability(result: &AnalysisResult) -> f64 {
        Pattern::ALL.iter().map(|&p| result.probability(p)).sum()
    }

    #[test]
    fn test_config_default() {
        let config = PredictorConfig::default();
        assert_eq!(config.max_fudge_factor, 5);
        assert_eq!(config.min_base_price, 90);
        assert_eq!(config.max_base_price, 110);
    }

    #[test]
    fn test_config_partial_deserialize() {
        let config: PredictorConfig = serde_json::from_str(r#"{"max_fudge_factor": 2}"#).unwrap();
        assert_eq!(config.max_fudge_factor, 2);
        assert_eq!(config.min_base_price, 90);
    }

    #[test]
    fn test_partitions_cover_all_slots() {
        for pattern in Pattern::ALL {
            let parts = partitions(pattern);
            assert!(!parts.is_empty());
            for part in &parts {
                assert!(check_partition(pattern, &part.lengths).is_ok());
            }
            let weight: f64 = parts.iter().map(|p| p.weight).sum();
            assert!((weight - 1.0).abs() < 1e-12, "{pattern} weights sum to {weight}");
        }
        assert_eq!(partitions(Pattern::Fluctuating).len(), 56);
        assert_eq!(partitions(Pattern::LargeSpike).len(), 7);
        assert_eq!(partitions(Pattern::Decreasing).len(), 1);
        assert_eq!(partitions(Pattern::SmallSpike).len(), 8);
    }

    #[test]
    fn test_bad_partition_is_internal_error() {
        let given = week(Some(100), &[]);
        let ctx = PhaseContext::new(&given, 100, 0);
        let err = simulate(&ctx, Pattern::Decreasing, &[11]).unwrap_err();
        assert_eq!(
            err,
            PredictionError::PhaseLengthMismatch {
                pattern: Pattern::Decreasing,
                total: 11
            }
        );
        assert!(err.is_internal());

        let err = simulate(&ctx, Pattern::Decreasing, &[6, 6]).unwrap_err();
        assert!(err.is_internal());
    }

    #[test]
    fn test_zero_base_price_rejected() {
        let err = Predictor::new(week(Some(0), &[]), false, None).unwrap_err();
        assert_eq!(err, PredictionError::InvalidBasePrice);
        assert!(!err.is_internal());
    }

    #[test]
    fn test_golden_base_98() {
        let predictor = Predictor::new(week(Some(98), &[]), false, None).unwrap();
        let result = predictor.analyze().unwrap();

        for pattern in Pattern::ALL {
            assert!(result.probability(pattern) > 0.0, "{pattern} missing");
        }
        assert!((total_probability(&result) - 1.0).abs() < 1e-9);

        // With nothing observed each pattern keeps its prior
        let prior = Pattern::Decreasing.transition_probability(None);
        assert!((result.probability(Pattern::Decreasing) - prior).abs() < 1e-9);

        let spike = result.pattern(Pattern::LargeSpike).unwrap();
        let bounds = spike.prices.unwrap();
        let peak = bounds.iter().map(|r| r.max).max().unwrap();
        assert_eq!(peak, 588);
        assert_eq!(spike.week_max, Some(588));

        let totals = result.totals.prices.unwrap();
        assert_eq!(totals[0], PriceRange::pinned(98));
        assert_eq!(totals[1], PriceRange::pinned(98));
    }

    #[test]
    fn test_decreasing_max_non_increasing() {
        let predictor = Predictor::new(week(Some(100), &[]), false, None).unwrap();
        let result = predictor.analyze().unwrap();
        let bounds = result.pattern(Pattern::Decreasing).unwrap().prices.unwrap();
        for slot in 3..SLOT_COUNT {
            assert!(bounds[slot].max <= bounds[slot - 1].max);
        }
    }

    #[test]
    fn test_observation_pins_slots() {
        let predictor = Predictor::new(week(Some(100), &[(2, 88), (3, 84)]), false, None).unwrap();
        let result = predictor.analyze().unwrap();
        assert!(!result.is_empty());
        assert!((total_probability(&result) - 1.0).abs() < 1e-9);
        for t in result.trajectories() {
            assert_eq!(t.prices[2], PriceRange::pinned(88));
            assert_eq!(t.prices[3], PriceRange::pinned(84));
        }
        // A fall from 88 to 84 rules out a flat-high Monday
        assert!(result.probability(Pattern::Decreasing) > 0.0);
    }

    #[test]
    fn test_impossible_prices_give_empty_result() {
        let predictor = Predictor::new(week(Some(100), &[(2, 1000)]), false, None).unwrap();
        let result = predictor.analyze().unwrap();
        assert!(result.is_empty());
        assert_eq!(result.most_likely_pattern(), None);
        for pattern in Pattern::ALL {
            assert_eq!(result.probability(pattern), 0.0);
        }
        assert!(result.totals.prices.is_none());
    }

    #[test]
    fn test_first_cycle_is_small_spike_only() {
        let predictor = Predictor::new(week(Some(100), &[]), true, None).unwrap();
        let result = predictor.analyze().unwrap();
        assert!((result.probability(Pattern::SmallSpike) - 1.0).abs() < 1e-9);
        assert_eq!(result.probability(Pattern::LargeSpike), 0.0);
        assert_eq!(result.most_likely_pattern(), Some(Pattern::SmallSpike));
        // Every candidate base price is tried even though the base is known
        let bases: std::collections::BTreeSet<u32> =
            result.trajectories().map(|t| t.base_price).collect();
        assert_eq!(bases.len(), 21);
    }

    #[test]
    fn test_unknown_base_pools_candidates() {
        let predictor = Predictor::new(week(None, &[(2, 120)]), false, Some(Pattern::Fluctuating)).unwrap();
        let result = predictor.analyze().unwrap();
        assert!(!result.is_empty());
        assert!((total_probability(&result) - 1.0).abs() < 1e-9);
        assert!(result.trajectories().all(|t| (90..=110).contains(&t.base_price)));
        let totals = result.totals.prices.unwrap();
        assert_eq!(totals[2], PriceRange::pinned(120));
        assert!(totals[0].min >= 90 && totals[0].max <= 110);
    }

    #[test]
    fn test_fudge_escalation() {
        // 141 is one unit above the flat-random ceiling on base 100
        let mut prices = week(Some(100), &[(2, 141)]);
        prices[3] = Some(141);
        let predictor = Predictor::new(prices, false, Some(Pattern::Decreasing)).unwrap();
        assert!(predictor.trajectories_at(0).unwrap().is_empty());
        assert!(!predictor.trajectories_at(1).unwrap().is_empty());

        let result = predictor.analyze().unwrap();
        assert!(!result.is_empty());
        for t in result.trajectories() {
            assert_eq!(t.prices[2], PriceRange::pinned(141));
        }
    }

    #[test]
    fn test_previous_pattern_shifts_prior() {
        let after_decreasing = Predictor::new(week(Some(100), &[]), false, Some(Pattern::Decreasing))
            .unwrap()
            .analyze()
            .unwrap();
        assert!((after_decreasing.probability(Pattern::LargeSpike) - 0.45).abs() < 1e-9);
        assert_eq!(after_decreasing.most_likely_pattern(), Some(Pattern::LargeSpike));
    }
}
