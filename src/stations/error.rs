use thiserror::Error;

#[derive(Debug, Error)]
pub enum StationError {
    #[error("Failed to parse station reference GeoJSON")]
    GeoJsonParse(#[from] geojson::Error),

    #[error("Station reference is a GeoJSON '{0}', expected a FeatureCollection")]
    NotAFeatureCollection(String),
}
