//! Query input types: weekday and month selections and the minute-of-day window.

use crate::analysis::error::QueryError;
use crate::types::weekday::AccidentWeekday;
use crate::utils::format_minutes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Last minute of a day (`23:59`).
pub const LAST_MINUTE_OF_DAY: u32 = 24 * 60 - 1;

/// Either every value, or exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Selection<T> {
    All,
    Only(T),
}

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Selection::All
    }
}

impl<T: PartialEq + Copy> Selection<T> {
    /// `true` if `value` is selected.
    pub fn matches(&self, value: T) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(selected) => *selected == value,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }
}

/// Weekday filter, using the accident convention.
pub type WeekdaySelection = Selection<AccidentWeekday>;

/// Month filter. `Only` values are guaranteed to be in `1..=12` when built via
/// [`Selection::month`] or [`FromStr`].
pub type MonthSelection = Selection<u32>;

impl Selection<AccidentWeekday> {
    /// Selects a single weekday by accident code (`1` = Sunday … `7` = Saturday).
    pub fn weekday(code: u8) -> Result<Self, QueryError> {
        AccidentWeekday::from_code(code)
            .map(Selection::Only)
            .ok_or(QueryError::InvalidWeekday(code))
    }
}

impl Selection<u32> {
    /// Selects a single calendar month (`1..=12`).
    pub fn month(month: u32) -> Result<Self, QueryError> {
        if (1..=12).contains(&month) {
            Ok(Selection::Only(month))
        } else {
            Err(QueryError::InvalidMonth(month))
        }
    }

    /// The months covered by this selection, in calendar order.
    pub fn months(&self) -> Vec<u32> {
        match self {
            Selection::All => (1..=12).collect(),
            Selection::Only(month) => vec![*month],
        }
    }
}

impl FromStr for Selection<AccidentWeekday> {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(Selection::All);
        }
        let code = s
            .parse::<u8>()
            .map_err(|_| QueryError::InvalidSelection(s.to_string()))?;
        Selection::weekday(code)
    }
}

impl FromStr for Selection<u32> {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(Selection::All);
        }
        let month = s
            .parse::<u32>()
            .map_err(|_| QueryError::InvalidSelection(s.to_string()))?;
        Selection::month(month)
    }
}

impl<T: fmt::Display> fmt::Display for Selection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => f.write_str("all"),
            Selection::Only(value) => write!(f, "{value}"),
        }
    }
}

/// An inclusive minute-of-day window, `start <= end`, both in `0..=1439`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "(u32, u32)", into = "(u32, u32)")]
pub struct MinuteRange {
    start: u32,
    end: u32,
}

impl MinuteRange {
    /// The whole day, `00:00` to `23:59`.
    pub const FULL_DAY: MinuteRange = MinuteRange {
        start: 0,
        end: LAST_MINUTE_OF_DAY,
    };

    /// Builds a window, rejecting minutes past `23:59` and inverted bounds.
    ///
    /// # Examples
    ///
    /// ```
    /// use velostat::MinuteRange;
    ///
    /// let office_hours = MinuteRange::new(8 * 60, 17 * 60).unwrap();
    /// assert!(office_hours.contains(12 * 60));
    /// assert!(MinuteRange::new(600, 500).is_err());
    /// ```
    pub fn new(start: u32, end: u32) -> Result<Self, QueryError> {
        for minute in [start, end] {
            if minute > LAST_MINUTE_OF_DAY {
                return Err(QueryError::MinuteOutOfRange(minute));
            }
        }
        if start > end {
            return Err(QueryError::InvertedMinuteRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    /// Inclusive on both ends.
    pub fn contains(&self, minute_of_day: u32) -> bool {
        self.start <= minute_of_day && minute_of_day <= self.end
    }

    /// Moves the start. If it passes the current end the window collapses onto the new start.
    pub fn with_start(self, start: u32) -> Result<Self, QueryError> {
        if start > self.end {
            MinuteRange::new(start, start)
        } else {
            MinuteRange::new(start, self.end)
        }
    }

    /// Moves the end. If it falls before the current start the window collapses onto the new end.
    pub fn with_end(self, end: u32) -> Result<Self, QueryError> {
        if end < self.start {
            MinuteRange::new(end, end)
        } else {
            MinuteRange::new(self.start, end)
        }
    }
}

impl TryFrom<(u32, u32)> for MinuteRange {
    type Error = QueryError;

    fn try_from((start, end): (u32, u32)) -> Result<Self, Self::Error> {
        MinuteRange::new(start, end)
    }
}

impl From<MinuteRange> for (u32, u32) {
    fn from(range: MinuteRange) -> Self {
        (range.start, range.end)
    }
}

impl fmt::Display for MinuteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            format_minutes(self.start),
            format_minutes(self.end)
        )
    }
}

/// A complete filter selection.
///
/// `time_range` only applies to bike counts; accident records carry no time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Query {
    pub weekday: WeekdaySelection,
    pub month: MonthSelection,
    pub time_range: Option<MinuteRange>,
}

impl Query {
    pub fn new(
        weekday: WeekdaySelection,
        month: MonthSelection,
        time_range: Option<MinuteRange>,
    ) -> Self {
        Self {
            weekday,
            month,
            time_range,
        }
    }

    /// Re-checks the invariants of a query that may have been assembled by hand or
    /// deserialized from untrusted input.
    pub fn validate(&self) -> Result<(), QueryError> {
        if let Selection::Only(month) = self.month {
            Selection::month(month)?;
        }
        if let Some(range) = self.time_range {
            MinuteRange::new(range.start, range.end)?;
        }
        Ok(())
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "weekday={} month={}", self.weekday, self.month)?;
        if let Some(range) = self.time_range {
            write!(f, " time={range}")?;
        }
        Ok(())
    }
}
