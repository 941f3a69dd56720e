//! Stateless reductions over already filtered records.

use crate::analysis::calendar::{days_in_category, DayCounts};
use crate::types::query::Query;
use crate::types::records::{AccidentRecord, BikeCountRecord};
use crate::utils::round_two_decimals;
use serde::Serialize;

/// Average traffic of one hour of the day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourlyAverage {
    /// `0..=23`
    pub hour: u32,
    /// `"{hour}:00"`, e.g. `"8:00"`.
    pub label: String,
    /// Rounded mean count of the records in this hour, `0` if there were none.
    pub average: u64,
    /// Number of records that fell into this hour.
    pub records: usize,
}

/// Buckets records by hour of day and averages each bucket.
///
/// Always returns exactly 24 entries, ordered by hour.
///
/// # Examples
///
/// ```
/// use velostat::{hourly_profile, parse_bike_count_csv};
///
/// let text = "t,c\n2019-01-07 08:00:00,10\n2019-01-07 08:15:00,20\n2019-01-07 08:30:00,30\n";
/// let records = parse_bike_count_csv("s", text);
/// let profile = hourly_profile(&records);
/// assert_eq!(profile.len(), 24);
/// assert_eq!(profile[8].label, "8:00");
/// assert_eq!(profile[8].average, 20);
/// assert_eq!(profile[9].average, 0);
/// ```
pub fn hourly_profile<'a>(
    records: impl IntoIterator<Item = &'a BikeCountRecord>,
) -> Vec<HourlyAverage> {
    let mut sums = [0u64; 24];
    let mut occurrences = [0usize; 24];
    for record in records {
        let hour = (record.minute_of_day() / 60) as usize;
        sums[hour] += record.count;
        occurrences[hour] += 1;
    }

    (0..24u32)
        .map(|hour| {
            let index = hour as usize;
            HourlyAverage {
                hour,
                label: format!("{hour}:00"),
                average: rounded_ratio(sums[index], occurrences[index] as u64),
                records: occurrences[index],
            }
        })
        .collect()
}

/// Accidents per calendar day, split into workdays and weekend days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccidentRates {
    /// Rounded accidents per workday.
    pub workday: u64,
    /// Rounded accidents per weekend day.
    pub weekend: u64,
    /// Matching accidents on workdays / weekend days.
    pub accidents: DayCounts,
    /// Calendar days the accidents are spread over.
    pub days: DayCounts,
}

impl AccidentRates {
    /// `round(numerator / denominator)` per category, `0` where there are no days.
    pub fn from_counts(accidents: DayCounts, days: DayCounts) -> Self {
        Self {
            workday: rounded_ratio(accidents.workday.into(), days.workday.into()),
            weekend: rounded_ratio(accidents.weekend.into(), days.weekend.into()),
            accidents,
            days,
        }
    }
}

/// Average number of matching accidents per workday and per weekend day.
///
/// The numerators are the `accidents` matching `query` (weekday and month); the
/// denominators are all workdays and weekend days of `years` within the selected
/// month(s). The weekday selection narrows the numerators only.
/// Accidents without coordinates are counted too.
pub fn accident_rates(accidents: &[AccidentRecord], query: &Query, years: &[i32]) -> AccidentRates {
    let mut counts = DayCounts::default();
    for accident in accidents {
        if !(query.weekday.matches(accident.weekday) && query.month.matches(accident.month)) {
            continue;
        }
        if accident.weekday.is_workday() {
            counts.workday += 1;
        } else {
            counts.weekend += 1;
        }
    }
    let days = days_in_category(years, query.month);
    AccidentRates::from_counts(counts, days)
}

/// Sum and number of the matching count records of one station.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StationAverage {
    pub total: u64,
    pub matched: usize,
}

impl StationAverage {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a BikeCountRecord>) -> Self {
        records
            .into_iter()
            .fold(StationAverage::default(), |acc, record| StationAverage {
                total: acc.total + record.count,
                matched: acc.matched + 1,
            })
    }

    /// `total / matched`, `0.0` without matches.
    pub fn average(&self) -> f64 {
        if self.matched == 0 {
            0.0
        } else {
            self.total as f64 / self.matched as f64
        }
    }

    /// The average rounded to two decimals, for statistics tables.
    pub fn average_for_display(&self) -> f64 {
        round_two_decimals(self.average())
    }

    /// The average rounded to a whole number, for symbols and charts.
    pub fn average_rounded(&self) -> u64 {
        self.average().round() as u64
    }
}

fn rounded_ratio(numerator: u64, denominator: u64) -> u64 {
    if denominator == 0 {
        0
    } else {
        (numerator as f64 / denominator as f64).round() as u64
    }
}
