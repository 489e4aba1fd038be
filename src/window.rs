use chrono::{Datelike, Days, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::models::SchoolDay;

/// Monday–Friday span the schedule is computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekWindow {
    pub mon: NaiveDate,
    pub fri: NaiveDate,
}

impl WeekWindow {
    /// The current school week, or the upcoming one on weekends.
    ///
    /// Fails for dates at the edge of the calendar where that week cannot be
    /// represented.
    pub fn resolve(today: NaiveDate) -> Result<Self, ValidationError> {
        let out_of_range = || ValidationError::DateOutOfRange(today);
        let fri = next_friday(today).ok_or_else(out_of_range)?;
        let mon = fri.checked_sub_days(Days::new(4)).ok_or_else(out_of_range)?;
        Ok(Self { mon, fri })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.mon <= date && date <= self.fri
    }

    pub fn day(&self, day: SchoolDay) -> NaiveDate {
        self.mon + Duration::days(i64::from(day.number() - 1))
    }
}

/// Today when it is a Friday, otherwise the next Friday after it.
pub fn next_friday(today: NaiveDate) -> Option<NaiveDate> {
    let from_monday = i64::from(today.weekday().num_days_from_monday());
    let days_ahead = (4 - from_monday).rem_euclid(7);
    today.checked_add_days(Days::new(days_ahead.unsigned_abs()))
}
