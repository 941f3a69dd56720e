use crate::stations::error::StationError;
use crate::types::records::Coordinate;
use crate::types::station::Station;
use geojson::feature::Id;
use geojson::{Feature, GeoJson, JsonValue, Value};
use log::warn;
use rstar::RTree;
use std::collections::BTreeMap;

/// The counting stations known to the analysis, by id.
///
/// Stations are also indexed in an R-tree so accidents can be attributed to the
/// closest one.
#[derive(Debug, Clone, Default)]
pub struct StationRegistry {
    stations: BTreeMap<String, Station>,
    rtree: RTree<Station>,
}

// --- GeoJSON input ---

fn station_from_feature(feature: &Feature) -> Option<Station> {
    let id = match feature.property("id") {
        Some(JsonValue::String(id)) => id.trim().to_string(),
        Some(JsonValue::Number(id)) => id.to_string(),
        Some(_) => return None,
        None => match feature.id.as_ref()? {
            Id::String(id) => id.trim().to_string(),
            Id::Number(id) => id.to_string(),
        },
    };
    let name = feature
        .property("name")
        .and_then(JsonValue::as_str)
        .map(str::to_string);

    let Value::Point(position) = &feature.geometry.as_ref()?.value else {
        return None;
    };
    let longitude = *position.first()?;
    let latitude = *position.get(1)?;

    Some(Station::new(id, name, Coordinate::new(longitude, latitude)))
}

impl StationRegistry {
    /// Builds a registry from stations. A later station replaces an earlier one with the same id.
    pub fn from_stations(stations: impl IntoIterator<Item = Station>) -> Self {
        let stations: BTreeMap<String, Station> = stations
            .into_iter()
            .map(|station| (station.id.clone(), station))
            .collect();
        let rtree = RTree::bulk_load(stations.values().cloned().collect());
        Self { stations, rtree }
    }

    /// Reads a GeoJSON `FeatureCollection` of point features.
    ///
    /// Each feature needs an `id` (a string or number `id` property, or the feature id)
    /// and may carry a `name` property.
    /// Features that are not points or have no id are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`StationError::GeoJsonParse`] for invalid JSON and
    /// [`StationError::NotAFeatureCollection`] for other GeoJSON objects.
    ///
    /// # Examples
    ///
    /// ```
    /// use velostat::StationRegistry;
    ///
    /// let geojson = r#"{
    ///   "type": "FeatureCollection",
    ///   "features": [{
    ///     "type": "Feature",
    ///     "properties": { "id": 100020113, "name": "Neutor" },
    ///     "geometry": { "type": "Point", "coordinates": [7.6166, 51.9665] }
    ///   }]
    /// }"#;
    /// let registry = StationRegistry::from_geojson_str(geojson).unwrap();
    /// assert_eq!(registry.get("100020113").unwrap().display_name(), "Neutor");
    /// ```
    pub fn from_geojson_str(text: &str) -> Result<Self, StationError> {
        let collection = match text.parse::<GeoJson>()? {
            GeoJson::FeatureCollection(collection) => collection,
            GeoJson::Feature(_) => {
                return Err(StationError::NotAFeatureCollection("Feature".into()))
            }
            GeoJson::Geometry(_) => {
                return Err(StationError::NotAFeatureCollection("Geometry".into()))
            }
        };

        let total = collection.features.len();
        let stations: Vec<Station> = collection
            .features
            .iter()
            .filter_map(station_from_feature)
            .collect();
        if stations.len() < total {
            warn!(
                "Skipped {} station features without id or point geometry",
                total - stations.len()
            );
        }
        Ok(Self::from_stations(stations))
    }

    pub fn get(&self, id: &str) -> Option<&Station> {
        self.stations.get(id)
    }

    /// The station's name, or `"Station {id}"` for unknown stations and stations without one.
    pub fn display_name(&self, id: &str) -> String {
        match self.get(id) {
            Some(station) => station.display_name(),
            None => format!("Station {id}"),
        }
    }

    /// Stations ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = &Station> {
        self.stations.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.stations.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// The station closest to `location` in degree space.
    pub fn nearest(&self, location: Coordinate) -> Option<&Station> {
        self.rtree
            .nearest_neighbor(&[location.longitude, location.latitude])
    }
}
