//! Phase simulators shared by every pattern.
//!
//! Rates are sell price over base price, scaled by [`RATE_MULTIPLIER`] so the
//! decaying phases can bucket them at integer resolution. Each simulator
//! writes its slots' bounds and returns the likelihood of the observed prices
//! in that phase, or `None` once that likelihood reaches zero.
//!
//! The price rounding here must match the generator exactly: a rate turns
//! into a price by rounding up with a tolerance of 1e-5, and an observed price
//! maps back to the half-open band of rates that would have produced it.

use crate::analysis::{PriceRange, SlotBounds};
use crate::error::PredictionError;
use crate::math::{clamp, RateRange};
use crate::pdf::ProbabilityDensityFunction;
use crate::{Result, Slots};

pub const RATE_MULTIPLIER: f64 = 10000.0;

/// Round up unless already within 1e-5 of an integer.
fn intceil(val: f64) -> i64 {
    (val + 0.99999).trunc() as i64
}

/// Price produced by a scaled `rate` on `base_price`.
pub fn price_from_rate(rate: f64, base_price: u32) -> u32 {
    intceil(rate * f64::from(base_price) / RATE_MULTIPLIER).max(0) as u32
}

/// Scaled rates that round to `price` on `base_price`.
pub fn rate_range_from_price(price: u32, base_price: u32) -> RateRange {
    let price = f64::from(price);
    let base = f64::from(base_price);
    RateRange::new(
        RATE_MULTIPLIER * (price - 0.99999) / base,
        RATE_MULTIPLIER * (price + 0.00001) / base,
    )
}

/// Inputs shared by every phase of one simulated path.
///
/// `fudge` widens every acceptance check by that many price units.
#[derive(Debug, Clone, Copy)]
pub struct PhaseContext<'a> {
    pub given: &'a Slots,
    pub base_price: u32,
    pub fudge: u32,
}

impl<'a> PhaseContext<'a> {
    pub fn new(given: &'a Slots, base_price: u32, fudge: u32) -> Self {
        Self {
            given,
            base_price,
            fudge,
        }
    }

    fn price(&self, rate: f64) -> u32 {
        price_from_rate(rate, self.base_price)
    }

    fn accepts(&self, observed: u32, min: u32, max: u32) -> bool {
        let observed = i64::from(observed);
        let fudge = i64::from(self.fudge);
        observed >= i64::from(min) - fudge && observed <= i64::from(max) + fudge
    }

    /// Slots whose rates are drawn independently from `[rate_min, rate_max]`.
    pub fn flat_random(
        &self,
        prices: &mut SlotBounds,
        start: usize,
        length: usize,
        rate_min: f64,
        rate_max: f64,
    ) -> Option<f64> {
        let rate_range = RateRange::new(rate_min * RATE_MULTIPLIER, rate_max * RATE_MULTIPLIER);
        let min_pred = self.price(rate_range.min);
        let max_pred = self.price(rate_range.max);
        let mut prob = 1.0;

        for slot in start..start + length {
            prices[slot] = match self.given[slot] {
                Some(observed) => {
                    if !self.accepts(observed, min_pred, max_pred) {
                        return None;
                    }
                    let real_rate_range = rate_range_from_price(
                        clamp(observed, min_pred, max_pred),
                        self.base_price,
                    );
                    prob *= rate_range.intersect_length(&real_rate_range) / rate_range.length();
                    if prob <= 0.0 {
                        return None;
                    }
                    PriceRange::pinned(observed)
                }
                None => PriceRange::new(min_pred, max_pred),
            };
        }
        Some(prob)
    }

    /// Slots whose rate falls by an independent uniform amount each step.
    #[allow(clippy::too_many_arguments)]
    pub fn decreasing(
        &self,
        prices: &mut SlotBounds,
        start: usize,
        length: usize,
        start_rate_min: f64,
        start_rate_max: f64,
        rate_decay_min: f64,
        rate_decay_max: f64,
    ) -> Option<f64> {
        let mut rate_pdf = ProbabilityDensityFunction::uniform(
            start_rate_min * RATE_MULTIPLIER,
            start_rate_max * RATE_MULTIPLIER,
        );
        let mut prob = 1.0;

        for slot in start..start + length {
            let min_pred = self.price(rate_pdf.min_value());
            let max_pred = self.price(rate_pdf.max_value());
            prices[slot] = match self.given[slot] {
                Some(observed) => {
                    if !self.accepts(observed, min_pred, max_pred) {
                        return None;
                    }
                    let real_rate_range = rate_range_from_price(
                        clamp(observed, min_pred, max_pred),
                        self.base_price,
                    );
                    prob *= rate_pdf.restrict(real_rate_range);
                    if prob <= 0.0 {
                        return None;
                    }
                    PriceRange::pinned(observed)
                }
                None => PriceRange::new(min_pred, max_pred),
            };

            rate_pdf.decay(
                rate_decay_min * RATE_MULTIPLIER,
                rate_decay_max * RATE_MULTIPLIER,
            );
        }
        Some(prob)
    }

    /// Three-slot spike climax.
    ///
    /// The middle rate is drawn from `[rate_min, rate_max]`; each flank is the
    /// middle minus an extra uniform draw, floored at `rate_min`, minus one
    /// price unit. A flank observation is scored with the closed-form
    /// distribution of that flank given the accepted middle range.
    pub fn peak(
        &self,
        prices: &mut SlotBounds,
        start: usize,
        rate_min: f64,
        rate_max: f64,
    ) -> Result<Option<f64>> {
        let full_range = RateRange::new(rate_min * RATE_MULTIPLIER, rate_max * RATE_MULTIPLIER);
        let low = self.price(full_range.min);
        let high = self.price(full_range.max);
        let mut rate_range = full_range;
        let mut prob = 1.0;

        if let Some(middle) = self.given[start + 1] {
            if !self.accepts(middle, low, high) {
                return Ok(None);
            }
            let real_rate_range =
                rate_range_from_price(clamp(middle, low, high), self.base_price);
            prob *= full_range.intersect_length(&real_rate_range) / full_range.length();
            if prob <= 0.0 {
                return Ok(None);
            }
            rate_range = full_range
                .intersect(&real_rate_range)
                .ok_or(PredictionError::EmptyIntersection { slot: start + 1 })?;
        }

        let flank_cdf = FlankDistribution {
            middle: rate_range,
            floor: full_range.min,
        };
        for flank in [self.given[start], self.given[start + 2]].into_iter().flatten() {
            let min_pred = low.saturating_sub(1);
            let max_pred = self.price(rate_range.max).saturating_sub(1);
            if !self.accepts(flank, min_pred, max_pred) {
                return Ok(None);
            }
            let flank_rates =
                rate_range_from_price(clamp(flank, min_pred, max_pred) + 1, self.base_price);
            prob *= flank_cdf.cdf(flank_rates.max) - flank_cdf.cdf(flank_rates.min);
            if prob <= 0.0 {
                return Ok(None);
            }
        }

        prices[start] = match self.given[start] {
            Some(observed) => PriceRange::pinned(observed),
            None => PriceRange::new(low.saturating_sub(1), high.saturating_sub(1)),
        };
        prices[start + 1] = match self.given[start + 1] {
            Some(observed) => PriceRange::pinned(observed),
            None => PriceRange::new(prices[start].min.min(high), high),
        };
        prices[start + 2] = match self.given[start + 2] {
            Some(observed) => PriceRange::pinned(observed),
            None => PriceRange::new(
                low.saturating_sub(1),
                prices[start + 1].max.saturating_sub(1).max(low.saturating_sub(1)),
            ),
        };

        Ok(Some(prob))
    }
}

/// Distribution of a flank rate `floor + U * (M - floor)`, `U ~ [0, 1]`,
/// with the middle rate `M` uniform on `middle`.
#[derive(Debug, Clone, Copy)]
struct FlankDistribution {
    middle: RateRange,
    floor: f64,
}

impl FlankDistribution {
    /// Integral of `min(1, t / z)` for `z` from 0 to `zz`, with `t` measured
    /// from the floor.
    fn integral(t: f64, zz: f64) -> f64 {
        if t <= 0.0 {
            return 0.0;
        }
        if zz < t {
            zz
        } else {
            t - t * (t.ln() - zz.ln())
        }
    }

    fn cdf(&self, rate: f64) -> f64 {
        let z1 = self.middle.min - self.floor;
        let z2 = self.middle.max - self.floor;
        let t = rate - self.floor;
        (Self::integral(t, z2) - Self::integral(t, z1)) / (z2 - z1)
    }
}
