//! School clock: when each period starts and how long the gaps are.

use chrono::{NaiveTime, Timelike};

use crate::error::ValidationError;

pub const PERIOD_MINUTES: i64 = 45;
pub const LAST_PERIOD: i32 = 13;

pub fn period_start(period: i32) -> Option<NaiveTime> {
    let (hour, minute) = match period {
        1 => (7, 45),
        2 => (8, 30),
        3 => (9, 45),
        4 => (10, 30),
        5 => (11, 45),
        6 => (12, 30),
        7 => (13, 15),
        8 => (14, 0),
        9 => (14, 45),
        10 => (15, 30),
        11 => (16, 15),
        12 => (17, 0),
        13 => (17, 45),
        _ => return None,
    };
    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn start_minutes(period: i32) -> Option<i64> {
    period_start(period).map(|time| i64::from(time.hour() * 60 + time.minute()))
}

/// Minutes from the start of the first period to the end of the last one.
pub fn period_duration(periods: &[i32]) -> Option<i64> {
    match periods {
        [] => None,
        [_] => Some(PERIOD_MINUTES),
        [first, .., last] => {
            gap_minutes(Some(*first), Some(*last), true).map(|span| span + PERIOD_MINUTES)
        }
    }
}

/// Minutes between period `last` and period `next`.
///
/// With `buffer` the gap is measured from the start of `last`, otherwise from
/// its end. `None` when either period is missing or unknown, when `last` does
/// not come before `next`, or when nothing lies between them.
pub fn gap_minutes(last: Option<i32>, next: Option<i32>, buffer: bool) -> Option<i64> {
    let (last, next) = (last?, next?);
    if last >= next {
        return None;
    }

    let from = start_minutes(last)? + if buffer { 0 } else { PERIOD_MINUTES };
    let to = start_minutes(next)?;
    let gap = (to - from).abs();
    (gap > 0).then_some(gap)
}

/// Periods must be a non-empty ascending run like `[3, 4, 5]`.
pub fn validate_periods(periods: &[i32]) -> Result<(), ValidationError> {
    if periods.is_empty() {
        return Err(ValidationError::EmptyPeriods);
    }
    if let Some(period) = periods.iter().find(|p| !(1..=LAST_PERIOD).contains(*p)) {
        return Err(ValidationError::PeriodOutOfRange(*period));
    }
    if periods.windows(2).any(|pair| pair[1] != pair[0] + 1) {
        return Err(ValidationError::NonContiguousPeriods(periods.to_vec()));
    }
    Ok(())
}

/// Parses `"3"` or an inclusive range such as `"3-5"`.
pub fn parse_periods(raw: &str) -> Result<Vec<i32>, ValidationError> {
    let invalid = || ValidationError::InvalidPeriodRange(raw.to_string());
    let (first, last) = match raw.trim().split_once('-') {
        Some((first, last)) => (first.trim(), last.trim()),
        None => (raw.trim(), raw.trim()),
    };
    let first: i32 = first.parse().map_err(|_| invalid())?;
    let last: i32 = last.parse().map_err(|_| invalid())?;
    if last < first {
        return Err(invalid());
    }

    let periods: Vec<i32> = (first..=last).collect();
    validate_periods(&periods)?;
    Ok(periods)
}
