use crate::config::AnalysisConfig;
use crate::dataset::Dataset;
use crate::ingest::error::IngestError;
use crate::ingest::source::DataSource;
use crate::parsing::accidents::parse_accident_csv;
use crate::parsing::bike_counts::parse_bike_count_csv;
use crate::stations::registry::StationRegistry;
use crate::types::records::{AccidentRecord, BikeCountRecord};
use crate::types::source::{SourceKind, SourceLayout};
use crate::utils::decode_text;
use futures_util::{stream, StreamExt, TryStreamExt};
use log::{info, warn};
use reqwest::Client;
use serde::Serialize;
use std::error::Error;
use tokio::io::AsyncReadExt;
use tokio::{fs, task};
use tokio_util::io::StreamReader;

/// A source that could not be loaded and contributed no records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedSource {
    pub kind: SourceKind,
    /// Path relative to the data source.
    pub path: String,
    pub reason: String,
}

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Number of files that were fetched and parsed.
    pub loaded_sources: usize,
    pub skipped_sources: Vec<SkippedSource>,
}

impl IngestReport {
    pub fn skipped_count(&self) -> usize {
        self.skipped_sources.len()
    }

    fn skip(&mut self, kind: SourceKind, path: &str, reason: String) {
        warn!("Skipping {} source '{}': {}", kind, path, reason);
        self.skipped_sources.push(SkippedSource {
            kind,
            path: path.to_string(),
            reason,
        });
    }
}

enum SourceRequest {
    BikeCounts { station_id: String, path: String },
    Accidents { path: String },
}

impl SourceRequest {
    fn kind(&self) -> SourceKind {
        match self {
            SourceRequest::BikeCounts { .. } => SourceKind::BikeCounts,
            SourceRequest::Accidents { .. } => SourceKind::Accidents,
        }
    }

    fn path(&self) -> &str {
        match self {
            SourceRequest::BikeCounts { path, .. } | SourceRequest::Accidents { path } => path,
        }
    }
}

enum ParsedSource {
    BikeCounts {
        station_id: String,
        records: Vec<BikeCountRecord>,
    },
    Accidents(Vec<AccidentRecord>),
}

/// Fetches and parses every source file of an analysis.
pub struct DataLoader {
    source: DataSource,
    layout: SourceLayout,
    download_client: Client,
}

impl DataLoader {
    pub fn new(source: DataSource) -> Self {
        Self::with_layout(source, SourceLayout::default())
    }

    pub fn with_layout(source: DataSource, layout: SourceLayout) -> Self {
        Self {
            source,
            layout,
            download_client: Client::new(),
        }
    }

    pub fn source(&self) -> &DataSource {
        &self.source
    }

    pub fn layout(&self) -> &SourceLayout {
        &self.layout
    }

    /// Loads the station reference and every bike count and accident file named by `config`.
    ///
    /// All files are fetched concurrently, at most `config.fetch_concurrency` at a time.
    /// Files are merged in request order (stations, then years, then months, then the
    /// accident years), so the resulting data set does not depend on which fetch finished
    /// first. A file that cannot be fetched is recorded in the report and otherwise
    /// ignored; a missing station reference leaves the registry empty.
    pub async fn load(&self, config: &AnalysisConfig) -> (Dataset, IngestReport) {
        let requests = self.requests(config);
        let concurrency = config.fetch_concurrency.max(1);

        let fetch_all = async {
            let mut results: Vec<(usize, Result<ParsedSource, IngestError>)> =
                stream::iter(requests.iter().enumerate())
                    .map(|(index, request)| async move { (index, self.load_source(request).await) })
                    .buffer_unordered(concurrency)
                    .collect()
                    .await;
            results.sort_by_key(|(index, _)| *index);
            results
        };
        let (stations, results) = tokio::join!(self.load_stations(), fetch_all);

        let mut report = IngestReport::default();
        let stations = match stations {
            Ok(stations) => {
                report.loaded_sources += 1;
                stations
            }
            Err(reason) => {
                report.skip(SourceKind::StationReference, &self.layout.station_reference, reason);
                StationRegistry::default()
            }
        };

        let mut dataset = Dataset::new(stations);
        let prefilter = config.accident_prefilter.as_ref();
        let mut accidents_read = 0usize;
        for ((_, result), request) in results.into_iter().zip(&requests) {
            match result {
                Ok(ParsedSource::BikeCounts {
                    station_id,
                    records,
                }) => {
                    dataset.extend_bike_counts(&station_id, records);
                    report.loaded_sources += 1;
                }
                Ok(ParsedSource::Accidents(records)) => {
                    accidents_read += records.len();
                    dataset.extend_accidents(records, prefilter);
                    report.loaded_sources += 1;
                }
                Err(e) => report.skip(request.kind(), request.path(), describe(&e)),
            }
        }

        info!(
            "Loaded {} stations, {} bike count records and {} of {} accident records from {} ({} sources loaded, {} skipped)",
            dataset.stations.len(),
            dataset.bike_count_len(),
            dataset.accidents.len(),
            accidents_read,
            self.source,
            report.loaded_sources,
            report.skipped_count()
        );
        (dataset, report)
    }

    fn requests(&self, config: &AnalysisConfig) -> Vec<SourceRequest> {
        let mut requests = Vec::new();
        for station_id in &config.station_ids {
            for &year in &config.years {
                for month in 1..=12 {
                    requests.push(SourceRequest::BikeCounts {
                        station_id: station_id.clone(),
                        path: self.layout.bike_count_path(station_id, year, month),
                    });
                }
            }
        }
        for &year in &config.years {
            requests.push(SourceRequest::Accidents {
                path: self.layout.accident_path(year),
            });
        }
        requests
    }

    async fn load_stations(&self) -> Result<StationRegistry, String> {
        let bytes = self
            .fetch_bytes(&self.layout.station_reference)
            .await
            .map_err(|e| describe(&e))?;
        let parsed = task::spawn_blocking(move || {
            StationRegistry::from_geojson_str(&decode_text(&bytes))
        })
        .await
        .map_err(|e| describe(&IngestError::TaskJoin(e)))?;
        parsed.map_err(|e| describe(&e))
    }

    /// Fetches one file and parses it on the blocking pool.
    async fn load_source(&self, request: &SourceRequest) -> Result<ParsedSource, IngestError> {
        let bytes = self.fetch_bytes(request.path()).await?;
        let parsed = match request {
            SourceRequest::BikeCounts { station_id, .. } => {
                let station_id = station_id.clone();
                task::spawn_blocking(move || {
                    let records = parse_bike_count_csv(&station_id, &decode_text(&bytes));
                    ParsedSource::BikeCounts {
                        station_id,
                        records,
                    }
                })
                .await?
            }
            SourceRequest::Accidents { .. } => {
                task::spawn_blocking(move || {
                    ParsedSource::Accidents(parse_accident_csv(&decode_text(&bytes)))
                })
                .await?
            }
        };
        Ok(parsed)
    }

    async fn fetch_bytes(&self, relative: &str) -> Result<Vec<u8>, IngestError> {
        match &self.source {
            DataSource::Http { .. } => self.download(&self.source.locate(relative)).await,
            DataSource::Directory(root) => {
                let path = root.join(relative);
                fs::read(&path)
                    .await
                    .map_err(|e| IngestError::FileRead(path, e))
            }
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, IngestError> {
        let response = self
            .download_client
            .get(url)
            .send()
            .await
            .map_err(|e| IngestError::NetworkRequest(url.to_string(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                return Err(match e.status() {
                    Some(status) => IngestError::HttpStatus {
                        url: url.to_string(),
                        status,
                        source: e,
                    },
                    None => IngestError::NetworkRequest(url.to_string(), e),
                });
            }
        };

        let stream = response
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
        let mut reader = StreamReader::new(stream);
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        Ok(bytes)
    }
}

/// The error message followed by its causes.
fn describe(error: &dyn Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AccidentPrefilter;
    use std::path::Path;

    const STATIONS: &str = r#"{
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": { "id": "100020113", "name": "Neutor" },
            "geometry": { "type": "Point", "coordinates": [7.6166, 51.9665] }
        }]
    }"#;

    fn write(root: &Path, relative: &str, contents: &[u8]) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    fn config() -> AnalysisConfig {
        AnalysisConfig::builder()
            .years(vec![2019])
            .station_ids(vec!["100020113".to_string()])
            .fetch_concurrency(3)
            .build()
    }

    #[tokio::test]
    async fn test_load_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let layout = SourceLayout::default();
        write(root, &layout.station_reference, STATIONS.as_bytes());
        for month in [1, 2, 3] {
            let text = format!("Zeit,Anzahl\n2019-{month:02}-07 08:00:00,{month}\n");
            write(root, &layout.bike_count_path("100020113", 2019, month), text.as_bytes());
        }
        // Latin-1 encoded accident file with a decimal comma.
        write(
            root,
            &layout.accident_path(2019),
            b"\"UMONAT\";\"UWOCHENTAG\";\"XGCSWGS84\";\"YGCSWGS84\";\"Stra\xdfe\"\n1;2;7,61;51,96;x\n",
        );

        let loader = DataLoader::new(DataSource::directory(root));
        let (dataset, report) = loader.load(&config()).await;

        assert_eq!(dataset.stations.len(), 1);
        let counts: Vec<u64> = dataset
            .bike_counts_of("100020113")
            .iter()
            .map(|record| record.count)
            .collect();
        assert_eq!(counts, vec![1, 2, 3]);
        assert_eq!(dataset.accidents.len(), 1);

        // Station reference, three count files and one accident file.
        assert_eq!(report.loaded_sources, 5);
        assert_eq!(report.skipped_count(), 9);
        assert!(report
            .skipped_sources
            .iter()
            .all(|skipped| skipped.kind == SourceKind::BikeCounts));
        assert_eq!(
            report.skipped_sources[0].path,
            "radverkehr-zaehlstellen/100020113/2019-04.csv"
        );
    }

    #[tokio::test]
    async fn test_missing_everything_degrades() {
        let dir = tempfile::tempdir().unwrap();
        let loader = DataLoader::new(DataSource::directory(dir.path()));
        let (dataset, report) = loader.load(&config()).await;

        assert!(dataset.stations.is_empty());
        assert_eq!(dataset.bike_count_len(), 0);
        assert!(dataset.accidents.is_empty());
        assert_eq!(report.loaded_sources, 0);
        assert_eq!(report.skipped_count(), 14);
        assert_eq!(report.skipped_sources[0].kind, SourceKind::StationReference);
        assert!(report.skipped_sources[0].reason.contains("Failed to read source file"));
    }

    #[tokio::test]
    async fn test_prefilter_applied_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let layout = SourceLayout::default();
        write(
            dir.path(),
            &layout.accident_path(2019),
            b"UMONAT;UWOCHENTAG;IstRad;ULAND\n1;2;1;05\n1;2;0;05\n3;4;1;5\n",
        );
        let config = AnalysisConfig::builder()
            .years(vec![2019])
            .station_ids(Vec::new())
            .accident_prefilter(AccidentPrefilter::north_rhine_westphalia())
            .build();
        let (dataset, report) = DataLoader::new(DataSource::directory(dir.path()))
            .load(&config)
            .await;
        assert_eq!(dataset.accidents.len(), 2);
        assert_eq!(report.loaded_sources, 1);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_skipped() {
        let config = AnalysisConfig::builder()
            .years(vec![2019])
            .station_ids(Vec::new())
            .build();
        let loader = DataLoader::new(DataSource::http("http://127.0.0.1:9"));
        let (dataset, report) = loader.load(&config).await;
        assert!(dataset.stations.is_empty());
        assert_eq!(report.loaded_sources, 0);
        assert_eq!(report.skipped_count(), 2);
        assert_eq!(report.skipped_sources[1].kind, SourceKind::Accidents);
        assert_eq!(report.skipped_sources[1].path, "Unfallorte2019_LinRef.csv");
    }
}
