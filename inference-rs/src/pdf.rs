//! Discrete probability density over unit-width integer buckets.
//!
//! Bucket `i` covers `[start + i, start + i + 1)`. The decaying phases track
//! the distribution of the current rate with this type: an observation
//! restricts it, and every half-day step subtracts an independent uniform
//! decrement.

use crate::math::{compensated_sum, prefix_compensated_sum, RateRange};

#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityDensityFunction {
    value_start: i64,
    value_end: i64,
    prob: Vec<f64>,
}

impl ProbabilityDensityFunction {
    /// Rasterize the uniform distribution on `[a, b]`.
    ///
    /// Each bucket gets the fraction of `[a, b]` it overlaps, so the weights
    /// already sum to 1.
    pub fn uniform(a: f64, b: f64) -> Self {
        let value_start = a.floor() as i64;
        let value_end = b.ceil() as i64;
        let range = RateRange::new(a, b);
        let total_length = range.length();

        if total_length <= 0.0 {
            // Point mass: a single bucket holding everything.
            return Self {
                value_start,
                value_end: value_start + 1,
                prob: vec![1.0],
            };
        }

        let mut pdf = Self {
            value_start,
            value_end,
            prob: Vec::new(),
        };
        pdf.prob = (0..(value_end - value_start) as usize)
            .map(|i| pdf.range_of(i).intersect_length(&range) / total_length)
            .collect();
        pdf
    }

    fn range_of(&self, idx: usize) -> RateRange {
        let start = (self.value_start + idx as i64) as f64;
        RateRange::new(start, start + 1.0)
    }

    /// Lower edge of the support.
    pub fn min_value(&self) -> f64 {
        self.value_start as f64
    }

    /// Upper edge of the support.
    pub fn max_value(&self) -> f64 {
        self.value_end as f64
    }

    pub fn weights(&self) -> &[f64] {
        &self.prob
    }

    pub fn is_empty(&self) -> bool {
        self.prob.is_empty()
    }

    pub fn total(&self) -> f64 {
        compensated_sum(&self.prob)
    }

    fn clear(&mut self) {
        self.value_start = 0;
        self.value_end = 0;
        self.prob.clear();
    }

    fn normalize(&mut self) -> f64 {
        let total = self.total();
        if total <= 0.0 || !total.is_finite() {
            self.clear();
            return 0.0;
        }
        for p in &mut self.prob {
            *p /= total;
        }
        total
    }

    /// Condition the distribution on the value lying in `range`.
    ///
    /// Returns the probability mass that fell inside `range` before
    /// renormalizing. An empty intersection empties the distribution and
    /// returns 0; every later call on an empty distribution also returns 0.
    pub fn restrict(&mut self, range: RateRange) -> f64 {
        let start = range.min.max(self.min_value());
        let end = range.max.min(self.max_value());
        if start >= end {
            self.clear();
            return 0.0;
        }
        let start = start.floor() as i64;
        let end = end.ceil() as i64;

        let start_idx = (start - self.value_start) as usize;
        let end_idx = (end - self.value_start) as usize;
        self.prob = (start_idx..end_idx)
            .map(|i| self.prob[i] * self.range_of(i).intersect_length(&range))
            .collect();
        self.value_start = start;
        self.value_end = end;

        self.normalize()
    }

    /// Subtract an independent uniform decrement in `[decay_min, decay_max]`.
    ///
    /// The support widens to `[start - decay_max, end - decay_min)`. Each new
    /// bucket averages the old buckets that can shift into it, with the two
    /// buckets at the window edges counted at half weight.
    pub fn decay(&mut self, decay_min: f64, decay_max: f64) {
        if self.is_empty() {
            return;
        }
        let decay_min = decay_min.round() as i64;
        let decay_max = decay_max.round() as i64;
        let width = decay_max - decay_min;

        if width <= 0 {
            // Deterministic decrement: a plain shift.
            self.value_start -= decay_max;
            self.value_end -= decay_min;
            return;
        }

        let prefix = prefix_compensated_sum(&self.prob);
        let old_len = self.prob.len() as i64;
        let new_len = old_len + width;

        let decayed = (0..new_len)
            .map(|i| {
                let left = (i - width).max(0);
                let right = (old_len - 1).min(i);
                let (hi_sum, hi_c) = prefix[(right + 1) as usize];
                let (lo_sum, lo_c) = prefix[left as usize];
                let mut terms = [hi_sum, hi_c, -lo_sum, -lo_c, 0.0, 0.0];
                if left == i - width {
                    terms[4] = -self.prob[left as usize] / 2.0;
                }
                if right == i {
                    terms[5] = -self.prob[right as usize] / 2.0;
                }
                compensated_sum(&terms) / width as f64
            })
            .collect();

        self.prob = decayed;
        self.value_start -= decay_max;
        self.value_end -= decay_min;
    }
}
