//! The four price patterns and how one cycle's pattern follows the last.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Qualitative shape of a cycle's prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pattern {
    Fluctuating = 0,
    LargeSpike = 1,
    Decreasing = 2,
    SmallSpike = 3,
}

/// Pattern probabilities for a cycle with no known predecessor.
///
/// Empirical frequencies out of 13082 observed cycles.
const PRIOR: [f64; 4] = [
    4530.0 / 13082.0,
    3236.0 / 13082.0,
    1931.0 / 13082.0,
    3385.0 / 13082.0,
];

/// `TRANSITIONS[previous][current]`, rows indexed by the previous pattern.
const TRANSITIONS: [[f64; 4]; 4] = [
    [0.20, 0.30, 0.15, 0.35],
    [0.50, 0.05, 0.20, 0.25],
    [0.25, 0.45, 0.05, 0.25],
    [0.45, 0.25, 0.15, 0.15],
];

impl Pattern {
    pub const ALL: [Pattern; 4] = [
        Pattern::Fluctuating,
        Pattern::LargeSpike,
        Pattern::Decreasing,
        Pattern::SmallSpike,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Probability of `self` this cycle given last cycle's pattern.
    ///
    /// Falls back to the empirical prior when `previous` is unknown.
    pub fn transition_probability(self, previous: Option<Pattern>) -> f64 {
        match previous {
            Some(prev) => TRANSITIONS[prev.index()][self.index()],
            None => PRIOR[self.index()],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Pattern::Fluctuating => "fluctuating",
            Pattern::LargeSpike => "large_spike",
            Pattern::Decreasing => "decreasing",
            Pattern::SmallSpike => "small_spike",
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
