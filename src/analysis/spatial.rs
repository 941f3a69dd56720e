//! Spatial matching between accidents and counting stations.
//!
//! Distances are plain degree deltas (a box around the station), not geodesic
//! distances. That is good enough within a single city but would need revisiting
//! for a larger area.

use crate::stations::registry::StationRegistry;
use crate::types::records::{AccidentRecord, Coordinate};
use crate::types::station::Station;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An axis aligned WGS84 box, bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// The extent of the city of Münster.
    pub const MUENSTER: BoundingBox = BoundingBox {
        min_x: 7.53,
        max_x: 7.75,
        min_y: 51.88,
        max_y: 52.05,
    };

    pub fn contains(&self, coordinate: Coordinate) -> bool {
        within_bounding_box(coordinate.longitude, coordinate.latitude, self)
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        BoundingBox::MUENSTER
    }
}

/// `true` if `(lon, lat)` lies inside `bounding_box`, edges included.
pub fn within_bounding_box(lon: f64, lat: f64, bounding_box: &BoundingBox) -> bool {
    lon >= bounding_box.min_x
        && lon <= bounding_box.max_x
        && lat >= bounding_box.min_y
        && lat <= bounding_box.max_y
}

/// Counts accidents whose longitude and latitude both differ from the station's by at
/// most `radius_degrees`. Accidents without coordinates never count.
///
/// # Examples
///
/// ```
/// use velostat::{nearby_accident_count, AccidentRecord, AccidentWeekday, Coordinate, Station};
///
/// let station = Station::new("s", None, Coordinate::new(7.60, 51.90));
/// let accident = |lon, lat| AccidentRecord {
///     month: 1,
///     weekday: AccidentWeekday::MONDAY,
///     location: Some(Coordinate::new(lon, lat)),
///     is_bicycle: None,
///     state_code: None,
/// };
/// let accidents = [accident(7.601, 51.901), accident(7.65, 51.90)];
/// assert_eq!(nearby_accident_count(&station, &accidents, 0.01), 1);
/// ```
pub fn nearby_accident_count<'a>(
    station: &Station,
    accidents: impl IntoIterator<Item = &'a AccidentRecord>,
    radius_degrees: f64,
) -> usize {
    accidents
        .into_iter()
        .filter_map(|accident| accident.location)
        .filter(|location| is_near(station.location, *location, radius_degrees))
        .count()
}

fn is_near(a: Coordinate, b: Coordinate, radius_degrees: f64) -> bool {
    (a.longitude - b.longitude).abs() <= radius_degrees
        && (a.latitude - b.latitude).abs() <= radius_degrees
}

/// Assigns every located accident to its single closest station, if that station lies
/// within `radius_degrees` on both axes. Returns the number of accidents per station id.
///
/// Unlike [`nearby_accident_count`], an accident close to two stations only counts once.
pub fn attribute_to_nearest<'a>(
    registry: &StationRegistry,
    accidents: impl IntoIterator<Item = &'a AccidentRecord>,
    radius_degrees: f64,
) -> BTreeMap<String, usize> {
    let mut attributed = BTreeMap::new();
    for location in accidents.into_iter().filter_map(|accident| accident.location) {
        if let Some(station) = registry.nearest(location) {
            if is_near(station.location, location, radius_degrees) {
                *attributed.entry(station.id.clone()).or_insert(0) += 1;
            }
        }
    }
    attributed
}
