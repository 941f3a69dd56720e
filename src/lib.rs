mod analysis;
mod config;
mod dataset;
mod error;
mod filtering;
mod ingest;
mod parsing;
mod stations;
mod types;
mod utils;
mod velostat;

pub use error::VelostatError;
pub use velostat::*;

pub use config::*;
pub use dataset::Dataset;

pub use analysis::aggregate::*;
pub use analysis::cache::{QueryCache, DEFAULT_QUERY_CACHE_CAPACITY};
pub use analysis::calendar::{days_in_category, DayCounts};
pub use analysis::error::QueryError;
pub use analysis::facade::*;
pub use analysis::radius::*;
pub use analysis::spatial::*;

pub use filtering::{TemporalFilterExt, TemporalMatch};

pub use ingest::error::IngestError;
pub use ingest::loader::{DataLoader, IngestReport, SkippedSource};
pub use ingest::source::DataSource;

pub use parsing::accidents::{columns as accident_columns, parse_accident_csv};
pub use parsing::bike_counts::parse_bike_count_csv;

pub use stations::error::StationError;
pub use stations::registry::StationRegistry;

pub use types::query::*;
pub use types::records::*;
pub use types::source::{SourceKind, SourceLayout};
pub use types::station::Station;
pub use types::weekday::*;

pub use utils::{decode_text, format_minutes, month_name, parse_clock, parse_decimal, time_options};
