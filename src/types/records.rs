//! Typed records produced by the CSV parsers.

use crate::types::weekday::AccidentWeekday;
use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinate {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }
}

/// One measurement interval (typically 15 or 60 minutes) at one counting station.
#[derive(Debug, Clone, PartialEq)]
pub struct BikeCountRecord {
    /// Id of the station the measurement belongs to. Shared between all records of a file.
    pub station_id: Arc<str>,
    /// Local civil time at the start of the interval.
    pub timestamp: NaiveDateTime,
    pub count: u64,
}

impl BikeCountRecord {
    /// Minutes since midnight (`hour * 60 + minute`), seconds are ignored.
    pub fn minute_of_day(&self) -> u32 {
        self.timestamp.hour() * 60 + self.timestamp.minute()
    }

    /// Hour of day, `0..=23`.
    pub fn hour(&self) -> u32 {
        self.timestamp.hour()
    }

    /// Calendar month, `1..=12`.
    pub fn month(&self) -> u32 {
        self.timestamp.month()
    }

    /// Weekday of the timestamp, converted to the accident convention.
    pub fn weekday(&self) -> AccidentWeekday {
        AccidentWeekday::of(self.timestamp.date())
    }
}

/// A geocoded traffic accident.
///
/// `location` is `None` when the source row carried no parsable coordinates; such
/// records still count for temporal aggregates but never take part in spatial queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccidentRecord {
    /// Calendar month, `1..=12` (`UMONAT`).
    pub month: u32,
    /// Weekday in the accident convention (`UWOCHENTAG`).
    pub weekday: AccidentWeekday,
    /// Position from `XGCSWGS84` / `YGCSWGS84`.
    pub location: Option<Coordinate>,
    /// `IstRad`: whether a bicycle was involved, if the column exists.
    pub is_bicycle: Option<bool>,
    /// `ULAND`: federal state code as written in the source, if the column exists.
    pub state_code: Option<String>,
}
