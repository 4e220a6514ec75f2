//! Error types for the prediction engine.

use crate::pattern::Pattern;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PredictionError {
    /// A phase-length partition does not cover exactly the 12 non-base slots.
    #[error("internal error: {pattern} phase lengths add up to {total}, expected 12")]
    PhaseLengthMismatch { pattern: Pattern, total: usize },

    /// A range intersection that must be non-empty came back empty.
    #[error("internal error: empty rate intersection at slot {slot}")]
    EmptyIntersection { slot: usize },

    #[error("base price must be positive")]
    InvalidBasePrice,

    #[error("unknown half-day slot: {0}")]
    UnknownSlot(String),
}

impl PredictionError {
    /// True for errors that indicate a defect in the enumeration itself.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            PredictionError::PhaseLengthMismatch { .. } | PredictionError::EmptyIntersection { .. }
        )
    }
}
