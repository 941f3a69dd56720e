//! Defines the weekday convention used throughout the crate.
//!
//! Two numbering schemes meet here. Timestamps (bike counts, calendar days) produce a
//! *native* day-of-week code where `0` is Sunday and `6` is Saturday. The accident
//! records, and every query, use the *accident convention* where `1` is Sunday,
//! `2` is Monday, …, `7` is Saturday. [`native_to_accident_code`] is the only place
//! where one is turned into the other.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Converts a native day-of-week code (`0` = Sunday … `6` = Saturday) into the
/// accident convention (`1` = Sunday … `7` = Saturday).
///
/// Valid input is `0..=6`. Larger codes are not a weekday; they map to a code above
/// `7` and saturate at `u8::MAX` instead of wrapping.
///
/// # Examples
///
/// ```
/// use velostat::native_to_accident_code;
///
/// assert_eq!(native_to_accident_code(0), 1); // Sunday
/// assert_eq!(native_to_accident_code(1), 2); // Monday
/// assert_eq!(native_to_accident_code(6), 7); // Saturday
/// ```
pub const fn native_to_accident_code(native_code: u8) -> u8 {
    if native_code == 0 {
        1
    } else {
        native_code.saturating_add(1)
    }
}

/// A day of the week in the accident convention (`1` = Sunday … `7` = Saturday).
///
/// Construct it from an accident code with [`AccidentWeekday::from_code`], from a
/// native code with [`AccidentWeekday::from_native_code`] or directly from a date
/// with [`AccidentWeekday::of`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct AccidentWeekday(u8);

impl AccidentWeekday {
    pub const SUNDAY: AccidentWeekday = AccidentWeekday(1);
    pub const MONDAY: AccidentWeekday = AccidentWeekday(2);
    pub const TUESDAY: AccidentWeekday = AccidentWeekday(3);
    pub const WEDNESDAY: AccidentWeekday = AccidentWeekday(4);
    pub const THURSDAY: AccidentWeekday = AccidentWeekday(5);
    pub const FRIDAY: AccidentWeekday = AccidentWeekday(6);
    pub const SATURDAY: AccidentWeekday = AccidentWeekday(7);

    /// Attempts to build a weekday from an accident-convention code.
    ///
    /// Returns `None` for anything outside `1..=7`.
    pub fn from_code(code: u8) -> Option<Self> {
        (1..=7).contains(&code).then_some(AccidentWeekday(code))
    }

    /// Attempts to build a weekday from a native code (`0` = Sunday … `6` = Saturday).
    ///
    /// Returns `None` for anything outside `0..=6`.
    pub fn from_native_code(native_code: u32) -> Option<Self> {
        (native_code <= 6).then(|| AccidentWeekday(native_to_accident_code(native_code as u8)))
    }

    /// The weekday a calendar date falls on.
    pub fn of(date: NaiveDate) -> Self {
        // `num_days_from_sunday` is always in `0..=6`.
        AccidentWeekday(native_to_accident_code(
            date.weekday().num_days_from_sunday() as u8,
        ))
    }

    /// The raw accident-convention code (`1..=7`).
    pub fn code(self) -> u8 {
        self.0
    }

    /// `true` for Monday to Friday (codes `2..=6`).
    pub fn is_workday(self) -> bool {
        (2..=6).contains(&self.0)
    }

    /// `true` for Saturday and Sunday (codes `1` and `7`).
    pub fn is_weekend(self) -> bool {
        !self.is_workday()
    }

    /// English display name.
    pub fn name(self) -> &'static str {
        match self.0 {
            1 => "Sunday",
            2 => "Monday",
            3 => "Tuesday",
            4 => "Wednesday",
            5 => "Thursday",
            6 => "Friday",
            _ => "Saturday",
        }
    }
}

impl TryFrom<u8> for AccidentWeekday {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        AccidentWeekday::from_code(code).ok_or_else(|| format!("weekday code {code} is not in 1..=7"))
    }
}

impl From<AccidentWeekday> for u8 {
    fn from(weekday: AccidentWeekday) -> Self {
        weekday.0
    }
}

impl fmt::Display for AccidentWeekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
