use std::path::PathBuf;
use thiserror::Error;

/// Failures loading the station mapping table or searching it.
#[derive(Debug, Error)]
pub enum LocateStationError {
    #[error("Failed to read station mapping '{0}'")]
    MappingRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse station mapping '{0}'")]
    MappingParse(PathBuf, #[source] polars::error::PolarsError),

    #[error("Station mapping '{path}' is missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Invalid station mapping row {row} in '{path}': {reason}")]
    InvalidRow {
        path: PathBuf,
        row: usize,
        reason: String,
    },

    #[error("Station mapping '{0}' contains no stations")]
    EmptyMapping(PathBuf),

    #[error("Cannot build a station index from an empty station list")]
    NoStations,

    // Covers errors joining tokio blocking tasks
    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
