use crate::analysis::error::QueryError;
use crate::config::ConfigError;
use crate::ingest::error::IngestError;
use crate::stations::error::StationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VelostatError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Station(#[from] StationError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
