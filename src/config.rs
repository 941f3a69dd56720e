//! Analysis settings: the calendar span, the ingested stations, the map extent and
//! the styling constants.
//!
//! Settings can be built in code through [`AnalysisConfig::builder`] or read from a
//! JSON document in which every field is optional.

use crate::analysis::radius::RadiusScaler;
use crate::analysis::spatial::BoundingBox;
use crate::types::records::AccidentRecord;
use bon::bon;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_YEARS: [i32; 5] = [2019, 2020, 2021, 2022, 2023];

pub const DEFAULT_STATION_IDS: [&str; 9] = [
    "100020113",
    "100031297",
    "100031300",
    "100034978",
    "100034980",
    "100034981",
    "100034982",
    "100035541",
    "100053305",
];

/// About 200 m around a station at Münster's latitude.
pub const DEFAULT_ACCIDENT_RADIUS_DEGREES: f64 = 0.002;

pub const DEFAULT_FETCH_CONCURRENCY: usize = 16;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse configuration")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Keeps only the accidents relevant to the analysis.
///
/// Mirrors the cleaning applied to the raw national accident atlas: bicycle
/// accidents in one federal state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccidentPrefilter {
    /// Keep only records with `IstRad == 1`.
    pub bicycle_only: bool,
    /// Accepted `ULAND` codes. Empty accepts every state. Leading zeros are ignored.
    pub state_codes: Vec<String>,
}

impl AccidentPrefilter {
    /// Bicycle accidents in North Rhine-Westphalia (`ULAND` 05).
    pub fn north_rhine_westphalia() -> Self {
        Self {
            bicycle_only: true,
            state_codes: vec!["05".to_string()],
        }
    }

    pub fn accepts(&self, accident: &AccidentRecord) -> bool {
        if self.bicycle_only && accident.is_bicycle != Some(true) {
            return false;
        }
        if self.state_codes.is_empty() {
            return true;
        }
        let Some(state) = accident.state_code.as_deref() else {
            return false;
        };
        let state = normalize_state_code(state);
        self.state_codes
            .iter()
            .any(|code| normalize_state_code(code) == state)
    }
}

fn normalize_state_code(code: &str) -> &str {
    let trimmed = code.trim().trim_start_matches('0');
    if trimmed.is_empty() && !code.trim().is_empty() {
        "0"
    } else {
        trimmed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Years whose calendar days form the denominators of the accident rates, and
    /// whose files are ingested.
    pub years: Vec<i32>,
    pub station_ids: Vec<String>,
    pub bounding_box: BoundingBox,
    /// Half width of the box around a station in which accidents count as nearby.
    pub accident_radius_degrees: f64,
    pub radius_scale: RadiusScaler,
    /// Maximum number of source files fetched at the same time.
    pub fetch_concurrency: usize,
    pub accident_prefilter: Option<AccidentPrefilter>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            years: DEFAULT_YEARS.to_vec(),
            station_ids: DEFAULT_STATION_IDS.iter().map(|id| id.to_string()).collect(),
            bounding_box: BoundingBox::MUENSTER,
            accident_radius_degrees: DEFAULT_ACCIDENT_RADIUS_DEGREES,
            radius_scale: RadiusScaler::default(),
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
            accident_prefilter: None,
        }
    }
}

#[bon]
impl AnalysisConfig {
    /// Builds a configuration, using the defaults for every setting that is not given.
    ///
    /// # Examples
    ///
    /// ```
    /// use velostat::AnalysisConfig;
    ///
    /// let config = AnalysisConfig::builder()
    ///     .years(vec![2022, 2023])
    ///     .accident_radius_degrees(0.005)
    ///     .build();
    /// assert_eq!(config.years, vec![2022, 2023]);
    /// assert_eq!(config.station_ids.len(), 9);
    /// assert!(config.validate().is_ok());
    /// ```
    #[builder]
    pub fn new(
        years: Option<Vec<i32>>,
        station_ids: Option<Vec<String>>,
        bounding_box: Option<BoundingBox>,
        accident_radius_degrees: Option<f64>,
        radius_scale: Option<RadiusScaler>,
        fetch_concurrency: Option<usize>,
        accident_prefilter: Option<AccidentPrefilter>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            years: years.unwrap_or(defaults.years),
            station_ids: station_ids.unwrap_or(defaults.station_ids),
            bounding_box: bounding_box.unwrap_or(defaults.bounding_box),
            accident_radius_degrees: accident_radius_degrees
                .unwrap_or(defaults.accident_radius_degrees),
            radius_scale: radius_scale.unwrap_or(defaults.radius_scale),
            fetch_concurrency: fetch_concurrency.unwrap_or(defaults.fetch_concurrency),
            accident_prefilter,
        }
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: AnalysisConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub async fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        Self::from_json_str(&text)
    }

    /// Checks the settings for values that would make every query meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.years.is_empty() {
            return Err(ConfigError::Invalid("at least one year is required".into()));
        }
        let bbox = &self.bounding_box;
        if bbox.min_x > bbox.max_x || bbox.min_y > bbox.max_y {
            return Err(ConfigError::Invalid(format!(
                "inverted bounding box {bbox:?}"
            )));
        }
        if !(self.accident_radius_degrees >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "accident radius must be non-negative, got {}",
                self.accident_radius_degrees
            )));
        }
        let scale = &self.radius_scale;
        if scale.min_radius > scale.max_radius {
            return Err(ConfigError::Invalid(format!(
                "min_radius {} exceeds max_radius {}",
                scale.min_radius, scale.max_radius
            )));
        }
        if !(scale.percentile > 0.0 && scale.percentile <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "percentile must be in (0, 1], got {}",
                scale.percentile
            )));
        }
        if self.fetch_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "fetch_concurrency must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::weekday::AccidentWeekday;
    use std::io::Write;

    fn accident(is_bicycle: Option<bool>, state_code: Option<&str>) -> AccidentRecord {
        AccidentRecord {
            month: 1,
            weekday: AccidentWeekday::MONDAY,
            location: None,
            is_bicycle,
            state_code: state_code.map(str::to_string),
        }
    }

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.years, vec![2019, 2020, 2021, 2022, 2023]);
        assert_eq!(config.station_ids[0], "100020113");
        assert_eq!(config.bounding_box, BoundingBox::MUENSTER);
        assert_eq!(config.accident_radius_degrees, 0.002);
        assert_eq!(config.fetch_concurrency, 16);
        assert!(config.validate().is_ok());
        assert_eq!(AnalysisConfig::builder().build(), config);
    }

    #[test]
    fn test_partial_json() {
        let config = AnalysisConfig::from_json_str(
            r#"{
                "years": [2021],
                "boundingBox": null,
                "radius_scale": { "max_radius": 10 }
            }"#,
        );
        // `boundingBox` is not a field name, unknown fields are ignored.
        let config = config.unwrap();
        assert_eq!(config.years, vec![2021]);
        assert_eq!(config.radius_scale.max_radius, 10.0);
        assert_eq!(config.radius_scale.min_radius, 2.0);
        assert_eq!(config.station_ids.len(), 9);

        let config = AnalysisConfig::from_json_str(
            r#"{ "bounding_box": { "minX": 7.0, "maxX": 8.0, "minY": 51.0, "maxY": 52.0 } }"#,
        )
        .unwrap();
        assert_eq!(config.bounding_box.max_x, 8.0);
    }

    #[test]
    fn test_validation() {
        let invalid = [
            r#"{ "years": [] }"#,
            r#"{ "bounding_box": { "minX": 8.0, "maxX": 7.0, "minY": 51.0, "maxY": 52.0 } }"#,
            r#"{ "accident_radius_degrees": -0.1 }"#,
            r#"{ "radius_scale": { "min_radius": 9 } }"#,
            r#"{ "radius_scale": { "percentile": 0 } }"#,
            r#"{ "fetch_concurrency": 0 }"#,
        ];
        for text in invalid {
            assert!(
                matches!(AnalysisConfig::from_json_str(text), Err(ConfigError::Invalid(_))),
                "{text} should be rejected"
            );
        }
        assert!(matches!(
            AnalysisConfig::from_json_str("{"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "fetch_concurrency": 4 }}"#).unwrap();
        let config = AnalysisConfig::from_json_file(file.path()).await.unwrap();
        assert_eq!(config.fetch_concurrency, 4);

        let missing = file.path().with_extension("missing");
        assert!(matches!(
            AnalysisConfig::from_json_file(&missing).await,
            Err(ConfigError::Read(path, _)) if path == missing
        ));
    }

    #[test]
    fn test_prefilter() {
        let nrw = AccidentPrefilter::north_rhine_westphalia();
        assert!(nrw.accepts(&accident(Some(true), Some("05"))));
        assert!(nrw.accepts(&accident(Some(true), Some("5"))));
        assert!(!nrw.accepts(&accident(Some(false), Some("05"))));
        assert!(!nrw.accepts(&accident(None, Some("05"))));
        assert!(!nrw.accepts(&accident(Some(true), Some("15"))));
        assert!(!nrw.accepts(&accident(Some(true), None)));

        let any = AccidentPrefilter::default();
        assert!(any.accepts(&accident(None, None)));
    }
}
