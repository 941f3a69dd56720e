use thiserror::Error;

/// A query the caller should never have sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Minute {0} is outside of a day (0..=1439)")]
    MinuteOutOfRange(u32),

    #[error("Time range start {start} lies after its end {end}")]
    InvertedMinuteRange { start: u32, end: u32 },

    #[error("Weekday code {0} is not in 1..=7 (1 = Sunday)")]
    InvalidWeekday(u8),

    #[error("Month {0} is not in 1..=12")]
    InvalidMonth(u32),

    #[error("Cannot parse selection '{0}', expected \"all\" or a number")]
    InvalidSelection(String),
}
