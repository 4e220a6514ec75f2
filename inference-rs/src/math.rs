//! Closed-interval arithmetic and compensated summation.
//!
//! Every probability the engine produces is the product or sum of dozens of
//! floating-point terms, so sums go through a Neumaier-style compensated
//! accumulator instead of a naive fold.

use serde::{Deserialize, Serialize};

/// A closed interval `[min, max]` on the real line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateRange {
    pub min: f64,
    pub max: f64,
}

impl RateRange {
    pub fn new(min: f64, max: f64) -> Self {
        debug_assert!(min <= max, "inverted range [{min}, {max}]");
        Self { min, max }
    }

    pub fn length(&self) -> f64 {
        self.max - self.min
    }

    /// Overlap of two ranges, `None` if they are disjoint.
    ///
    /// Ranges that only touch at an endpoint intersect in a zero-length range.
    pub fn intersect(&self, other: &RateRange) -> Option<RateRange> {
        if self.min > other.max || self.max < other.min {
            return None;
        }
        Some(RateRange {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        })
    }

    /// Length of the overlap, 0 if disjoint.
    pub fn intersect_length(&self, other: &RateRange) -> f64 {
        self.intersect(other).map_or(0.0, |r| r.length())
    }
}

pub fn clamp<T: PartialOrd>(x: T, min: T, max: T) -> T {
    if x < min {
        min
    } else if x > max {
        max
    } else {
        x
    }
}

/// Running sum with a separate correction term for lost low-order bits.
#[derive(Debug, Clone, Copy, Default)]
struct Compensated {
    sum: f64,
    correction: f64,
}

impl Compensated {
    fn add(&mut self, value: f64) {
        let t = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.correction += self.sum - t + value;
        } else {
            self.correction += value - t + self.sum;
        }
        self.sum = t;
    }
}

/// Sum `values` with Kahan-Babuska compensation.
pub fn compensated_sum(values: &[f64]) -> f64 {
    let mut acc = Compensated::default();
    for &v in values {
        acc.add(v);
    }
    acc.sum + acc.correction
}

/// Prefix sums as `(sum, correction)` pairs.
///
/// The result has `values.len() + 1` entries; entry `i` covers `values[..i]`,
/// so the sum of `values[a..b]` is recovered from entries `b` and `a` without
/// losing the compensation terms.
pub fn prefix_compensated_sum(values: &[f64]) -> Vec<(f64, f64)> {
    let mut prefix = Vec::with_capacity(values.len() + 1);
    prefix.push((0.0, 0.0));
    let mut acc = Compensated::default();
    for &v in values {
        acc.add(v);
        prefix.push((acc.sum, acc.correction));
    }
    prefix
}
