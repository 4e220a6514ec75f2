//! Named half-day observations for one cycle.
//!
//! Callers usually store a week as named fields; [`WeekPrices::to_slots`]
//! turns that into the 14-slot layout the predictor expects.

use crate::error::PredictionError;
use crate::pattern::Pattern;
use crate::predictor::Predictor;
use crate::{Result, Slots, SLOT_COUNT};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const WEEK_MILLIS: i64 = 604_800_000;

/// Shift that aligns week boundaries with Sunday 00:00 UTC.
const WEEK_OFFSET_MILLIS: i64 = 345_600_000;

/// Index of the week containing `unix_millis`, counted from the epoch.
pub fn week_number(unix_millis: i64) -> i64 {
    (unix_millis + WEEK_OFFSET_MILLIS).div_euclid(WEEK_MILLIS)
}

/// A half-day observation slot, Monday morning through Saturday evening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HalfDay {
    MondayAm,
    MondayPm,
    TuesdayAm,
    TuesdayPm,
    WednesdayAm,
    WednesdayPm,
    ThursdayAm,
    ThursdayPm,
    FridayAm,
    FridayPm,
    SaturdayAm,
    SaturdayPm,
}

impl HalfDay {
    pub const ALL: [HalfDay; 12] = [
        HalfDay::MondayAm,
        HalfDay::MondayPm,
        HalfDay::TuesdayAm,
        HalfDay::TuesdayPm,
        HalfDay::WednesdayAm,
        HalfDay::WednesdayPm,
        HalfDay::ThursdayAm,
        HalfDay::ThursdayPm,
        HalfDay::FridayAm,
        HalfDay::FridayPm,
        HalfDay::SaturdayAm,
        HalfDay::SaturdayPm,
    ];

    /// Position in the 14-slot layout.
    pub fn slot(self) -> usize {
        self as usize + 2
    }

    pub fn key(self) -> &'static str {
        match self {
            HalfDay::MondayAm => "monday_am",
            HalfDay::MondayPm => "monday_pm",
            HalfDay::TuesdayAm => "tuesday_am",
            HalfDay::TuesdayPm => "tuesday_pm",
            HalfDay::WednesdayAm => "wednesday_am",
            HalfDay::WednesdayPm => "wednesday_pm",
            HalfDay::ThursdayAm => "thursday_am",
            HalfDay::ThursdayPm => "thursday_pm",
            HalfDay::FridayAm => "friday_am",
            HalfDay::FridayPm => "friday_pm",
            HalfDay::SaturdayAm => "saturday_am",
            HalfDay::SaturdayPm => "saturday_pm",
        }
    }
}

impl FromStr for HalfDay {
    type Err = PredictionError;

    fn from_str(s: &str) -> Result<Self> {
        HalfDay::ALL
            .into_iter()
            .find(|h| h.key() == s)
            .ok_or_else(|| PredictionError::UnknownSlot(s.to_string()))
    }
}

/// One cycle's observed prices, by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeekPrices {
    pub buy: Option<u32>,
    pub monday_am: Option<u32>,
    pub monday_pm: Option<u32>,
    pub tuesday_am: Option<u32>,
    pub tuesday_pm: Option<u32>,
    pub wednesday_am: Option<u32>,
    pub wednesday_pm: Option<u32>,
    pub thursday_am: Option<u32>,
    pub thursday_pm: Option<u32>,
    pub friday_am: Option<u32>,
    pub friday_pm: Option<u32>,
    pub saturday_am: Option<u32>,
    pub saturday_pm: Option<u32>,
}

impl WeekPrices {
    fn field_mut(&mut self, half_day: HalfDay) -> &mut Option<u32> {
        match half_day {
            HalfDay::MondayAm => &mut self.monday_am,
            HalfDay::MondayPm => &mut self.monday_pm,
            HalfDay::TuesdayAm => &mut self.tuesday_am,
            HalfDay::TuesdayPm => &mut self.tuesday_pm,
            HalfDay::WednesdayAm => &mut self.wednesday_am,
            HalfDay::WednesdayPm => &mut self.wednesday_pm,
            HalfDay::ThursdayAm => &mut self.thursday_am,
            HalfDay::ThursdayPm => &mut self.thursday_pm,
            HalfDay::FridayAm => &mut self.friday_am,
            HalfDay::FridayPm => &mut self.friday_pm,
            HalfDay::SaturdayAm => &mut self.saturday_am,
            HalfDay::SaturdayPm => &mut self.saturday_pm,
        }
    }

    pub fn get(&self, half_day: HalfDay) -> Option<u32> {
        self.to_slots()[half_day.slot()]
    }

    pub fn set(&mut self, half_day: HalfDay, price: Option<u32>) {
        *self.field_mut(half_day) = price;
    }

    /// The predictor's slot layout: the buy price twice, then each half-day.
    pub fn to_slots(&self) -> Slots {
        [
            self.buy,
            self.buy,
            self.monday_am,
            self.monday_pm,
            self.tuesday_am,
            self.tuesday_pm,
            self.wednesday_am,
            self.wednesday_pm,
            self.thursday_am,
            self.thursday_pm,
            self.friday_am,
            self.friday_pm,
            self.saturday_am,
            self.saturday_pm,
        ]
    }

    /// Number of slots with a known price, counting the buy price once.
    pub fn observed(&self) -> usize {
        self.to_slots()[1..SLOT_COUNT].iter().flatten().count()
    }

    /// Build a predictor for this week.
    ///
    /// With no known previous pattern the week is treated as a first cycle.
    pub fn predictor(&self, previous: Option<Pattern>) -> Result<Predictor> {
        Predictor::new(self.to_slots(), previous.is_none(), previous)
    }
}
