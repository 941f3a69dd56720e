//! Composes filtering, aggregation, spatial matching and radius scaling into the
//! result of one query.

use crate::analysis::aggregate::{accident_rates, hourly_profile, AccidentRates, HourlyAverage, StationAverage};
use crate::analysis::error::QueryError;
use crate::analysis::radius::default_radius;
use crate::analysis::spatial::{attribute_to_nearest, nearby_accident_count};
use crate::config::AnalysisConfig;
use crate::dataset::Dataset;
use crate::filtering::{TemporalFilterExt, TemporalMatch};
use crate::types::query::Query;
use crate::types::records::{AccidentRecord, Coordinate};
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;

/// Figures of one counting station under a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationStats {
    /// Display name, `"Station {id}"` if the reference has none.
    pub name: String,
    /// `None` for stations that have count files but no reference entry.
    pub location: Option<Coordinate>,
    /// Sum of the matching counts.
    pub total: u64,
    /// Number of matching count records.
    pub matched_records: usize,
    /// Average count per matching record, rounded to two decimals.
    pub average: f64,
    /// Average count per matching record, rounded to a whole number.
    pub average_rounded: u64,
    /// Symbol radius scaled against the totals of all stations.
    pub radius: f64,
    /// Static radius derived from the unfiltered total.
    pub default_radius: f64,
    /// Matching accidents within the accident radius of the station.
    pub nearby_accidents: usize,
    /// Matching accidents for which this is the closest station within the radius.
    pub attributed_accidents: usize,
}

/// Traffic of one station next to the accidents around it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorrelationPair {
    pub station_id: String,
    /// Mean count of the matching records, rounded to a whole number.
    pub average_daily_bike_traffic: u64,
    pub nearby_accident_count: usize,
}

/// Everything derived from the data set for one [`Query`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub query: Query,
    /// 24 entries, hour 0 to 23, over the matching records of every station.
    pub hourly_profile: Vec<HourlyAverage>,
    pub accident_rates: AccidentRates,
    pub station_stats: BTreeMap<String, StationStats>,
    /// One pair per station with a known location.
    pub correlation: Vec<CorrelationPair>,
    /// Positions of the matching accidents inside the bounding box.
    pub mapped_accidents: Vec<Coordinate>,
}

/// Answers queries against one data set. Holds nothing but borrowed inputs, so
/// every call recomputes its result from scratch.
#[derive(Debug, Clone, Copy)]
pub struct QueryFacade<'a> {
    dataset: &'a Dataset,
    config: &'a AnalysisConfig,
}

impl<'a> QueryFacade<'a> {
    pub fn new(dataset: &'a Dataset, config: &'a AnalysisConfig) -> Self {
        Self { dataset, config }
    }

    /// Runs `query`.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] if the query holds an out of range month or an
    /// invalid minute range.
    pub fn run(&self, query: &Query) -> Result<QueryResult, QueryError> {
        query.validate()?;
        let dataset = self.dataset;
        let config = self.config;

        let hourly_profile = hourly_profile(
            dataset
                .all_bike_counts()
                .filter(|record| record.matches(query)),
        );
        let accident_rates = accident_rates(&dataset.accidents, query, &config.years);

        // --- Accidents on the map ---
        let mapped: Vec<&AccidentRecord> = dataset
            .accidents
            .matching(query)
            .filter(|accident| {
                accident
                    .location
                    .is_some_and(|location| config.bounding_box.contains(location))
            })
            .collect();
        let radius_degrees = config.accident_radius_degrees;
        let attributed = attribute_to_nearest(&dataset.stations, mapped.iter().copied(), radius_degrees);

        // --- Per station aggregates ---
        let averages: BTreeMap<&str, StationAverage> = dataset
            .station_ids()
            .into_iter()
            .map(|id| {
                let records = dataset.bike_counts_of(id).matching(query);
                (id, StationAverage::from_records(records))
            })
            .collect();
        let totals: Vec<u64> = averages.values().map(|average| average.total).collect();
        let scale = config.radius_scale.fit(&totals);

        let mut station_stats = BTreeMap::new();
        let mut correlation = Vec::new();
        for (id, average) in averages {
            let station = dataset.stations.get(id);
            let nearby_accidents = station.map_or(0, |station| {
                nearby_accident_count(station, mapped.iter().copied(), radius_degrees)
            });
            let unfiltered_total = StationAverage::from_records(dataset.bike_counts_of(id)).total;

            if station.is_some() {
                correlation.push(CorrelationPair {
                    station_id: id.to_string(),
                    average_daily_bike_traffic: average.average_rounded(),
                    nearby_accident_count: nearby_accidents,
                });
            }
            station_stats.insert(
                id.to_string(),
                StationStats {
                    name: dataset.stations.display_name(id),
                    location: station.map(|station| station.location),
                    total: average.total,
                    matched_records: average.matched,
                    average: average.average_for_display(),
                    average_rounded: average.average_rounded(),
                    radius: scale.radius(average.total),
                    default_radius: default_radius(unfiltered_total),
                    nearby_accidents,
                    attributed_accidents: attributed.get(id).copied().unwrap_or(0),
                },
            );
        }

        debug!(
            "Query {} matched {} mapped accidents over {} stations",
            query,
            mapped.len(),
            station_stats.len()
        );

        Ok(QueryResult {
            query: *query,
            hourly_profile,
            accident_rates,
            station_stats,
            correlation,
            mapped_accidents: mapped.iter().filter_map(|accident| accident.location).collect(),
        })
    }
}
