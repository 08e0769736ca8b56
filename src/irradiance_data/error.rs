use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IrradianceDataError {
    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to read cache file '{0}'")]
    CacheRead(PathBuf, #[source] PolarsError),

    #[error("Failed to write cache file '{0}'")]
    CacheWrite(PathBuf, #[source] std::io::Error),

    #[error("Encoding error writing cache file '{0}'")]
    CacheEncode(PathBuf, #[source] PolarsError),

    #[error("Cache file '{path}' is malformed: {message}")]
    CacheDecode { path: PathBuf, message: String },

    #[error("Failed to delete cache '{0}'")]
    CacheDeletion(PathBuf, #[source] std::io::Error),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Data download failed")]
    DownloadIo(#[source] std::io::Error),

    #[error("Archive for station '{station}' could not be opened")]
    ArchiveCorrupt {
        station: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Archive for station '{station}' has no entry '{path}'")]
    MissingEntry { station: String, path: String },

    #[error("Parsing error processing CSV data for station '{station}', year {year}")]
    CsvRead {
        station: String,
        year: i32,
        #[source]
        source: PolarsError,
    },

    #[error("CSV for station {station}, year {year} has {found} columns, at least {expected} required")]
    SchemaMismatch {
        station: String,
        year: i32,
        expected: usize,
        found: usize,
    },

    #[error("Row {offset} of station {station}, year {year} has {found} values, {expected} metrics configured")]
    ValueCountMismatch {
        station: String,
        year: i32,
        offset: usize,
        expected: usize,
        found: usize,
    },

    #[error("Invalid value '{value}' for station {station}, year {year}, row {row}, column {column}")]
    InvalidValue {
        station: String,
        year: i32,
        row: usize,
        column: usize,
        value: String,
    },

    #[error("No year tables to average for station '{station}'")]
    NoYearTables { station: String },

    #[error("Year {year} of station {station} has {found} rows after leap-day removal, expected {expected}")]
    RowCountMismatch {
        station: String,
        year: i32,
        expected: usize,
        found: usize,
    },

    #[error("Row {offset} of station {station} is {found} in {year}, expected {expected}")]
    CalendarMismatch {
        station: String,
        year: i32,
        offset: usize,
        expected: String,
        found: String,
    },

    #[error("Duplicate day/time key '{key}' for station {station}")]
    DuplicateKey { station: String, key: String },

    #[error("No irradiance data found for station '{station}' at '{key}'")]
    DataNotFound { station: String, key: String },

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
