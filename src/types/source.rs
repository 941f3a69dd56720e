//! Defines the kinds of source files the crate ingests and where they live
//! relative to a data root.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three kinds of input the analysis is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Per-station, per-month bike count CSV (comma separated).
    BikeCounts,
    /// Yearly accident CSV (semicolon separated).
    Accidents,
    /// GeoJSON feature collection with the station positions.
    StationReference,
}

impl SourceKind {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            SourceKind::BikeCounts => "bike counts",
            SourceKind::Accidents => "accidents",
            SourceKind::StationReference => "station reference",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Naming conventions of the source files, relative to the data root.
///
/// The defaults match the published Münster data set:
///
/// ```
/// use velostat::SourceLayout;
///
/// let layout = SourceLayout::default();
/// assert_eq!(
///     layout.bike_count_path("100020113", 2019, 3),
///     "radverkehr-zaehlstellen/100020113/2019-03.csv"
/// );
/// assert_eq!(layout.accident_path(2021), "Unfallorte2021_LinRef.csv");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceLayout {
    /// Directory holding one sub directory per station.
    pub bike_count_dir: String,
    /// Accident file name before the year.
    pub accident_prefix: String,
    /// Accident file name after the year.
    pub accident_suffix: String,
    /// Path of the station reference GeoJSON.
    pub station_reference: String,
}

impl Default for SourceLayout {
    fn default() -> Self {
        Self {
            bike_count_dir: "radverkehr-zaehlstellen".to_string(),
            accident_prefix: "Unfallorte".to_string(),
            accident_suffix: "_LinRef.csv".to_string(),
            station_reference: "fahrradzaehl-standorte.geojson".to_string(),
        }
    }
}

impl SourceLayout {
    /// `{bike_count_dir}/{station_id}/{year}-{MM}.csv`
    pub fn bike_count_path(&self, station_id: &str, year: i32, month: u32) -> String {
        format!(
            "{}/{}/{:04}-{:02}.csv",
            self.bike_count_dir.trim_end_matches('/'),
            station_id,
            year,
            month
        )
    }

    /// `{accident_prefix}{year}{accident_suffix}`
    pub fn accident_path(&self, year: i32) -> String {
        format!("{}{}{}", self.accident_prefix, year, self.accident_suffix)
    }
}
