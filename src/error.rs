//! Validation errors for timetable domain values.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid class identifier: {0}")]
    InvalidClass(String),
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),
    #[error("invalid week type: {0}")]
    InvalidWeekType(String),
    #[error("school day out of range (expected 1-5): {0}")]
    InvalidSchoolDay(i16),
    #[error("unknown tint: {0}")]
    UnknownTint(String),
    #[error("period list is empty")]
    EmptyPeriods,
    #[error("period {0} is outside 1..={max}", max = crate::timing::LAST_PERIOD)]
    PeriodOutOfRange(i32),
    #[error("periods must be ascending and contiguous: {0:?}")]
    NonContiguousPeriods(Vec<i32>),
    #[error("invalid period range: {0}")]
    InvalidPeriodRange(String),
    #[error("no school week can be resolved around {0}")]
    DateOutOfRange(chrono::NaiveDate),
}
