//! The in-memory snapshot every query runs against.

use crate::config::AccidentPrefilter;
use crate::parsing::accidents::parse_accident_csv;
use crate::parsing::bike_counts::parse_bike_count_csv;
use crate::stations::registry::StationRegistry;
use crate::types::records::{AccidentRecord, BikeCountRecord};
use std::collections::{BTreeMap, BTreeSet};

/// Normalized records of both data sets plus the station reference.
///
/// A dataset is only mutated while it is being assembled; queries borrow it immutably.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub stations: StationRegistry,
    /// Count records per station id, in ingestion order.
    pub bike_counts: BTreeMap<String, Vec<BikeCountRecord>>,
    pub accidents: Vec<AccidentRecord>,
}

impl Dataset {
    pub fn new(stations: StationRegistry) -> Self {
        Self {
            stations,
            ..Self::default()
        }
    }

    /// Parses one bike count file of `station_id` and appends its records.
    ///
    /// Returns the number of records added.
    pub fn add_bike_counts(&mut self, station_id: &str, text: &str) -> usize {
        let records = parse_bike_count_csv(station_id, text);
        self.extend_bike_counts(station_id, records)
    }

    pub fn extend_bike_counts(&mut self, station_id: &str, records: Vec<BikeCountRecord>) -> usize {
        let added = records.len();
        self.bike_counts
            .entry(station_id.to_string())
            .or_default()
            .extend(records);
        added
    }

    /// Parses one accident file and appends the records accepted by `prefilter`.
    ///
    /// Returns the number of records added.
    pub fn add_accidents(&mut self, text: &str, prefilter: Option<&AccidentPrefilter>) -> usize {
        let records = parse_accident_csv(text);
        self.extend_accidents(records, prefilter)
    }

    pub fn extend_accidents(
        &mut self,
        records: Vec<AccidentRecord>,
        prefilter: Option<&AccidentPrefilter>,
    ) -> usize {
        let before = self.accidents.len();
        match prefilter {
            Some(prefilter) => self
                .accidents
                .extend(records.into_iter().filter(|record| prefilter.accepts(record))),
            None => self.accidents.extend(records),
        }
        self.accidents.len() - before
    }

    /// Count records of one station; empty for stations without data.
    pub fn bike_counts_of(&self, station_id: &str) -> &[BikeCountRecord] {
        self.bike_counts
            .get(station_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every count record, grouped by station id.
    pub fn all_bike_counts(&self) -> impl Iterator<Item = &BikeCountRecord> {
        self.bike_counts.values().flatten()
    }

    /// Ids of the registered stations and of the stations that have count records,
    /// in ascending order.
    pub fn station_ids(&self) -> BTreeSet<&str> {
        self.stations
            .ids()
            .chain(self.bike_counts.keys().map(String::as_str))
            .collect()
    }

    pub fn bike_count_len(&self) -> usize {
        self.bike_counts.values().map(Vec::len).sum()
    }
}
