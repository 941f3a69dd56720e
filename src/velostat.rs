//! The main entry point: loads the data once and answers queries against it.

use crate::analysis::cache::QueryCache;
use crate::analysis::facade::{QueryFacade, QueryResult};
use crate::config::AnalysisConfig;
use crate::dataset::Dataset;
use crate::error::VelostatError;
use crate::ingest::loader::{DataLoader, IngestReport};
use crate::ingest::source::DataSource;
use crate::stations::registry::StationRegistry;
use crate::types::query::{MinuteRange, MonthSelection, Query, WeekdaySelection};
use bon::bon;
use log::{info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// What happened to the data loaded by a [`Velostat::refresh`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The new data replaced the previous snapshot.
    Applied { generation: u64 },
    /// A later refresh was started while this one was loading; its data was discarded.
    Superseded,
    /// The client was built from a fixed data set and has nothing to reload.
    NoSource,
}

struct Snapshot {
    generation: u64,
    dataset: Arc<Dataset>,
    report: IngestReport,
}

/// Client that ingests the bike count, accident and station files and runs
/// [`Query`]s against the loaded snapshot.
///
/// Results are memoized per snapshot, so repeating a query is cheap and returns the
/// identical result.
///
/// # Examples
///
/// ```no_run
/// # use velostat::{DataSource, Velostat, VelostatError};
/// # async fn run() -> Result<(), VelostatError> {
/// let client = Velostat::new(DataSource::http("https://example.org/data")).await?;
/// let result = client.query().month(5).weekday(2).call()?;
/// println!("{} stations", result.station_stats.len());
/// # Ok(())
/// # }
/// ```
pub struct Velostat {
    loader: Option<DataLoader>,
    config: AnalysisConfig,
    snapshot: RwLock<Snapshot>,
    latest_generation: AtomicU64,
    cache: QueryCache,
}

#[bon]
impl Velostat {
    /// Creates a client with the default configuration and loads all sources.
    ///
    /// # Errors
    ///
    /// Unavailable sources are not errors; see [`Velostat::ingest_report`].
    pub async fn new(source: DataSource) -> Result<Self, VelostatError> {
        Self::with_config(source, AnalysisConfig::default()).await
    }

    /// Creates a client and loads all sources named by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`VelostatError::Config`] if `config` does not validate.
    pub async fn with_config(
        source: DataSource,
        config: AnalysisConfig,
    ) -> Result<Self, VelostatError> {
        config.validate()?;
        let client = Self {
            loader: Some(DataLoader::new(source)),
            config,
            snapshot: RwLock::new(Snapshot {
                generation: 0,
                dataset: Arc::new(Dataset::default()),
                report: IngestReport::default(),
            }),
            latest_generation: AtomicU64::new(0),
            cache: QueryCache::new(),
        };
        client.refresh().await;
        Ok(client)
    }

    /// Creates a client over an already assembled data set.
    ///
    /// # Errors
    ///
    /// Returns [`VelostatError::Config`] if `config` does not validate.
    pub fn from_dataset(dataset: Dataset, config: AnalysisConfig) -> Result<Self, VelostatError> {
        config.validate()?;
        Ok(Self {
            loader: None,
            config,
            snapshot: RwLock::new(Snapshot {
                generation: 0,
                dataset: Arc::new(dataset),
                report: IngestReport::default(),
            }),
            latest_generation: AtomicU64::new(0),
            cache: QueryCache::new(),
        })
    }

    /// Reloads every source.
    ///
    /// If another refresh is started before this one finishes loading, the data
    /// loaded here is dropped instead of replacing the newer snapshot.
    pub async fn refresh(&self) -> RefreshOutcome {
        let Some(loader) = &self.loader else {
            return RefreshOutcome::NoSource;
        };
        let generation = self.begin_refresh();
        let (dataset, report) = loader.load(&self.config).await;
        self.install(generation, dataset, report)
    }

    fn begin_refresh(&self) -> u64 {
        self.latest_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn install(&self, generation: u64, dataset: Dataset, report: IngestReport) -> RefreshOutcome {
        let mut snapshot = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        if generation != self.latest_generation.load(Ordering::SeqCst)
            || generation <= snapshot.generation
        {
            warn!(
                "Discarding data of superseded refresh {} (latest is {})",
                generation,
                self.latest_generation.load(Ordering::SeqCst)
            );
            return RefreshOutcome::Superseded;
        }
        info!(
            "Applied refresh {}: {} bike count records, {} accidents, {} skipped sources",
            generation,
            dataset.bike_count_len(),
            dataset.accidents.len(),
            report.skipped_count()
        );
        *snapshot = Snapshot {
            generation,
            dataset: Arc::new(dataset),
            report,
        };
        drop(snapshot);
        self.cache.retain_generation(generation);
        RefreshOutcome::Applied { generation }
    }

    /// Runs a query assembled from its parts. Missing parts select everything.
    ///
    /// # Arguments
    ///
    /// * `.weekday(u8)` - Optional accident convention weekday code, `1` = Sunday … `7` = Saturday.
    /// * `.month(u32)` - Optional calendar month, `1..=12`.
    /// * `.time_range(MinuteRange)` - Optional minute of day window, bike counts only.
    ///
    /// # Errors
    ///
    /// Returns [`VelostatError::Query`] for a weekday or month out of range.
    #[builder]
    pub fn query(
        &self,
        weekday: Option<u8>,
        month: Option<u32>,
        time_range: Option<MinuteRange>,
    ) -> Result<Arc<QueryResult>, VelostatError> {
        let weekday = match weekday {
            Some(code) => WeekdaySelection::weekday(code)?,
            None => WeekdaySelection::All,
        };
        let month = match month {
            Some(month) => MonthSelection::month(month)?,
            None => MonthSelection::All,
        };
        self.run(&Query::new(weekday, month, time_range))
    }

    /// Runs `query` against the current snapshot, reusing a memoized result if there is one.
    pub fn run(&self, query: &Query) -> Result<Arc<QueryResult>, VelostatError> {
        let (generation, dataset) = {
            let snapshot = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
            (snapshot.generation, Arc::clone(&snapshot.dataset))
        };
        let result = self.cache.get_or_compute(generation, query, || {
            QueryFacade::new(&dataset, &self.config).run(query)
        })?;
        Ok(result)
    }

    /// What the last applied refresh loaded and skipped.
    pub fn ingest_report(&self) -> IngestReport {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .report
            .clone()
    }

    pub fn stations(&self) -> StationRegistry {
        self.dataset().stations.clone()
    }

    /// The current data set.
    pub fn dataset(&self) -> Arc<Dataset> {
        Arc::clone(
            &self
                .snapshot
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .dataset,
        )
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::error::QueryError;
    use crate::types::records::Coordinate;
    use crate::types::source::SourceLayout;
    use crate::types::station::Station;

    fn dataset(count: u64) -> Dataset {
        let registry = StationRegistry::from_stations(vec![Station::new(
            "a",
            None,
            Coordinate::new(7.6, 51.9),
        )]);
        let mut dataset = Dataset::new(registry);
        dataset.add_bike_counts("a", &format!("t,c\n2019-05-06 08:00:00,{count}\n"));
        dataset
    }

    fn config() -> AnalysisConfig {
        AnalysisConfig::builder().years(vec![2019]).build()
    }

    #[test]
    fn test_query_builder() {
        let client = Velostat::from_dataset(dataset(12), config()).unwrap();
        let result = client.query().weekday(2).month(5).call().unwrap();
        assert_eq!(result.station_stats["a"].total, 12);
        assert_eq!(result.hourly_profile[8].average, 12);

        let none = client.query().weekday(3).call().unwrap();
        assert_eq!(none.station_stats["a"].total, 0);

        assert!(matches!(
            client.query().weekday(8).call(),
            Err(VelostatError::Query(QueryError::InvalidWeekday(8)))
        ));
        assert!(matches!(
            client.query().month(0).call(),
            Err(VelostatError::Query(QueryError::InvalidMonth(0)))
        ));
    }

    #[test]
    fn test_repeated_query_is_memoized() {
        let client = Velostat::from_dataset(dataset(12), config()).unwrap();
        let first = client.query().month(5).call().unwrap();
        let second = client.query().month(5).call().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_superseded_refresh_is_discarded() {
        let client = Velostat::from_dataset(dataset(1), config()).unwrap();
        let before = client.query().call().unwrap();

        let older = client.begin_refresh();
        let newer = client.begin_refresh();
        assert_eq!(
            client.install(newer, dataset(3), IngestReport::default()),
            RefreshOutcome::Applied { generation: newer }
        );
        assert_eq!(
            client.install(older, dataset(2), IngestReport::default()),
            RefreshOutcome::Superseded
        );

        let after = client.query().call().unwrap();
        assert_eq!(before.station_stats["a"].total, 1);
        assert_eq!(after.station_stats["a"].total, 3);
    }

    #[test]
    fn test_stale_result_is_dropped_even_if_it_finishes_first() {
        let client = Velostat::from_dataset(dataset(1), config()).unwrap();
        let older = client.begin_refresh();
        let _newer = client.begin_refresh();
        assert_eq!(
            client.install(older, dataset(2), IngestReport::default()),
            RefreshOutcome::Superseded
        );
        assert_eq!(client.query().call().unwrap().station_stats["a"].total, 1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = AnalysisConfig::builder().years(Vec::new()).build();
        assert!(matches!(
            Velostat::from_dataset(Dataset::default(), config),
            Err(VelostatError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let layout = SourceLayout::default();
        let path = dir.path().join(layout.bike_count_path("a", 2019, 5));
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "t,c\n2019-05-06 08:00:00,9\n").unwrap();

        let config = AnalysisConfig::builder()
            .years(vec![2019])
            .station_ids(vec!["a".to_string()])
            .build();
        let client = Velostat::with_config(DataSource::directory(dir.path()), config)
            .await
            .unwrap();
        let report = client.ingest_report();
        assert_eq!(report.loaded_sources, 1);
        // Station reference, eleven months and the accident file.
        assert_eq!(report.skipped_count(), 13);
        assert!(client.stations().is_empty());

        let result = client.query().call().unwrap();
        assert_eq!(result.station_stats["a"].total, 9);
        assert_eq!(result.station_stats["a"].name, "Station a");

        assert!(matches!(
            client.refresh().await,
            RefreshOutcome::Applied { generation: 2 }
        ));
    }
}
