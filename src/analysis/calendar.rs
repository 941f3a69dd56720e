//! Calendar day counts used as denominators of the per-day accident rates.

use crate::types::query::MonthSelection;
use crate::types::weekday::AccidentWeekday;
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

pub(crate) fn days_in_month(year: i32, month: u32) -> Option<u32> {
    if !(1..=12).contains(&month) {
        return None;
    }
    let (next_month_year, next_month) = if month == 12 {
        (year.checked_add(1)?, 1)
    } else {
        (year, month + 1)
    };
    let first_day_of_next_month = NaiveDate::from_ymd_opt(next_month_year, next_month, 1)?;
    let last_day_of_current_month = first_day_of_next_month - Duration::days(1);
    Some(last_day_of_current_month.day())
}

/// Number of workdays (Monday to Friday) and weekend days in a calendar span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DayCounts {
    pub workday: u32,
    pub weekend: u32,
}

impl DayCounts {
    fn add(&mut self, weekday: AccidentWeekday) {
        if weekday.is_workday() {
            self.workday += 1;
        } else {
            self.weekend += 1;
        }
    }
}

/// Counts the workdays and weekend days of the selected month(s) in every one of `years`.
///
/// `MonthSelection::All` covers the twelve months of each year. Every day of the span
/// is counted whatever weekday a query selects. The span comes from the calendar alone;
/// it does not depend on which source files were available.
///
/// # Examples
///
/// ```
/// use velostat::{days_in_category, MonthSelection};
///
/// // January 2019 had 23 workdays and 8 weekend days.
/// let counts = days_in_category(&[2019], MonthSelection::Only(1));
/// assert_eq!((counts.workday, counts.weekend), (23, 8));
/// ```
pub fn days_in_category(years: &[i32], month: MonthSelection) -> DayCounts {
    let mut counts = DayCounts::default();
    for &year in years {
        for month in month.months() {
            let Some(days) = days_in_month(year, month) else {
                continue;
            };
            for day in 1..=days {
                let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
                    continue;
                };
                counts.add(AccidentWeekday::of(date));
            }
        }
    }
    counts
}
