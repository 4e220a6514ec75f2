//! Aggregated prediction output.
//!
//! A [`Trajectory`] is one simulated hidden-state path. [`AnalysisResult`]
//! groups the surviving trajectories by pattern and summarizes the price
//! bounds they admit on every slot.

use crate::math::compensated_sum;
use crate::pattern::Pattern;
use crate::SLOT_COUNT;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Inclusive integer price bounds for a single slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: u32,
    pub max: u32,
}

impl PriceRange {
    pub fn new(min: u32, max: u32) -> Self {
        debug_assert!(min <= max, "inverted price range [{min}, {max}]");
        Self { min, max }
    }

    /// A slot whose price is known exactly.
    pub fn pinned(price: u32) -> Self {
        Self {
            min: price,
            max: price,
        }
    }

    pub fn is_pinned(&self) -> bool {
        self.min == self.max
    }

    fn union(self, other: PriceRange) -> PriceRange {
        PriceRange {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// Per-slot bounds over a whole cycle.
pub type SlotBounds = [PriceRange; SLOT_COUNT];

/// One fully simulated path through a pattern's phases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub pattern: Pattern,

    /// Base price the path was simulated with (observed or a candidate).
    pub base_price: u32,

    /// Lengths of the pattern's phases over the 12 non-base slots.
    pub phase_lengths: Vec<usize>,

    pub prices: SlotBounds,

    pub probability: f64,

    /// Bounds of the last run of still-open slots.
    pub week_min: u32,
    pub week_max: u32,
}

impl Trajectory {
    pub fn new(
        pattern: Pattern,
        base_price: u32,
        phase_lengths: Vec<usize>,
        prices: SlotBounds,
        probability: f64,
    ) -> Self {
        let (week_min, week_max) = week_window(&prices);
        Self {
            pattern,
            base_price,
            phase_lengths,
            prices,
            probability,
            week_min,
            week_max,
        }
    }

    /// Identity of the path, independent of its probability.
    pub fn key(&self) -> (Pattern, u32, &[usize]) {
        (self.pattern, self.base_price, self.phase_lengths.as_slice())
    }
}

/// Summarize the final contiguous run of unpinned slots after the base.
///
/// A pinned slot resets the run, so the window always starts after the most
/// recent observation. With no open slot left, the last slot is used.
fn week_window(prices: &SlotBounds) -> (u32, u32) {
    let mut run: Option<(u32, u32)> = None;
    for day in &prices[2..] {
        if day.is_pinned() {
            run = None;
        } else {
            run = Some(match run {
                Some((lo, hi)) => (lo.max(day.min), hi.max(day.max)),
                None => (day.min, day.max),
            });
        }
    }
    run.unwrap_or_else(|| {
        let last = prices[SLOT_COUNT - 1];
        (last.min, last.max)
    })
}

/// Per-slot union of the trajectories' bounds, `None` when there are none.
fn global_bounds<'a>(trajectories: impl IntoIterator<Item = &'a Trajectory>) -> Option<SlotBounds> {
    trajectories.into_iter().fold(None, |acc, t| {
        Some(match acc {
            None => t.prices,
            Some(mut bounds) => {
                for (slot, price) in bounds.iter_mut().zip(t.prices.iter()) {
                    *slot = slot.union(*price);
                }
                bounds
            }
        })
    })
}

fn week_extremes<'a>(
    trajectories: impl IntoIterator<Item = &'a Trajectory>,
) -> (Option<u32>, Option<u32>) {
    trajectories
        .into_iter()
        .fold((None, None), |(lo, hi): (Option<u32>, Option<u32>), t| {
            (
                Some(lo.map_or(t.week_min, |v| v.min(t.week_min))),
                Some(hi.map_or(t.week_max, |v| v.max(t.week_max))),
            )
        })
}

/// Everything known about one pattern.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PatternSummary {
    pub trajectories: Vec<Trajectory>,

    /// Posterior probability mass of the pattern.
    pub probability: f64,

    pub week_min: Option<u32>,
    pub week_max: Option<u32>,

    /// Per-slot bounds across this pattern's trajectories.
    pub prices: Option<SlotBounds>,
}

impl PatternSummary {
    fn from_trajectories(trajectories: Vec<Trajectory>) -> Self {
        let probabilities: Vec<f64> = trajectories.iter().map(|t| t.probability).collect();
        let (week_min, week_max) = week_extremes(&trajectories);
        Self {
            probability: compensated_sum(&probabilities),
            week_min,
            week_max,
            prices: global_bounds(&trajectories),
            trajectories,
        }
    }

    pub fn is_possible(&self) -> bool {
        !self.trajectories.is_empty()
    }
}

/// Bounds across every pattern.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Totals {
    pub prices: Option<SlotBounds>,
    pub week_min: Option<u32>,
    pub week_max: Option<u32>,
}

/// Posterior prediction for a cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub patterns: BTreeMap<Pattern, PatternSummary>,
    pub totals: Totals,
}

impl AnalysisResult {
    /// The "no possibilities" result: nothing survived.
    pub fn empty() -> Self {
        Self::from_trajectories(Vec::new())
    }

    /// Normalize the trajectories' probabilities and aggregate them.
    ///
    /// If the total mass is 0 the result is empty rather than NaN.
    pub fn from_trajectories(mut trajectories: Vec<Trajectory>) -> Self {
        let probabilities: Vec<f64> = trajectories.iter().map(|t| t.probability).collect();
        let total = compensated_sum(&probabilities);
        if total > 0.0 && total.is_finite() {
            for t in &mut trajectories {
                t.probability /= total;
            }
        } else {
            trajectories.clear();
        }

        let (week_min, week_max) = week_extremes(&trajectories);
        let totals = Totals {
            prices: global_bounds(&trajectories),
            week_min,
            week_max,
        };

        let mut grouped: BTreeMap<Pattern, Vec<Trajectory>> =
            Pattern::ALL.iter().map(|&p| (p, Vec::new())).collect();
        for t in trajectories {
            grouped.entry(t.pattern).or_default().push(t);
        }
        let patterns = grouped
            .into_iter()
            .map(|(p, ts)| (p, PatternSummary::from_trajectories(ts)))
            .collect();

        Self { patterns, totals }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.values().all(|s| !s.is_possible())
    }

    pub fn pattern(&self, pattern: Pattern) -> Option<&PatternSummary> {
        self.patterns.get(&pattern)
    }

    pub fn probability(&self, pattern: Pattern) -> f64 {
        self.pattern(pattern).map_or(0.0, |s| s.probability)
    }

    /// Pattern with the greatest posterior mass; earlier patterns win ties.
    pub fn most_likely_pattern(&self) -> Option<Pattern> {
        let mut best: Option<(Pattern, f64)> = None;
        for (&pattern, summary) in &self.patterns {
            if !summary.is_possible() {
                continue;
            }
            if best.map_or(true, |(_, p)| summary.probability > p) {
                best = Some((pattern, summary.probability));
            }
        }
        best.map(|(pattern, _)| pattern)
    }

    /// All trajectories across every pattern.
    pub fn trajectories(&self) -> impl Iterator<Item = &Trajectory> {
        self.patterns.values().flat_map(|s| s.trajectories.iter())
    }
}
