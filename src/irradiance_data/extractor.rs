use crate::irradiance_data::error::IrradianceDataError;
use crate::types::config::SunshineConfig;
use crate::types::year_table::{parse_metric_value, YearRow, YearTable};
use async_compression::tokio::bufread::GzipDecoder;
use chrono::NaiveDate;
use log::{debug, info};
use polars::prelude::*;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use tokio::io::AsyncReadExt;
use tokio::task;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Pulls the per-year tables of one station out of its archive.
pub struct ArchiveExtractor {
    config: SunshineConfig,
}

impl ArchiveExtractor {
    pub fn new(config: &SunshineConfig) -> Self {
        ArchiveExtractor {
            config: config.clone(),
        }
    }

    /// Returns one table per entry of `years`, in the same order, each with its
    /// February 29th rows removed.
    ///
    /// Accepts gzip-compressed or plain tar archives.
    pub async fn extract(
        &self,
        archive: Vec<u8>,
        station: &str,
        years: &[i32],
    ) -> Result<Vec<YearTable>, IrradianceDataError> {
        let tar_bytes = decompress(archive, station).await?;

        let wanted: Vec<(i32, String)> = years
            .iter()
            .map(|&year| (year, self.config.entry_path(station, year)))
            .collect();
        let config = self.config.clone();
        let station_owned = station.to_string();

        let tables = task::spawn_blocking(move || {
            let mut entries = read_entries(tar_bytes, &station_owned, &wanted)?;
            wanted
                .iter()
                .map(|(year, path)| {
                    let bytes =
                        entries
                            .remove(path)
                            .ok_or_else(|| IrradianceDataError::MissingEntry {
                                station: station_owned.clone(),
                                path: path.clone(),
                            })?;
                    parse_year_table(&config, &station_owned, *year, bytes)
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .await??;

        info!(
            "Extracted {} year tables for station {}",
            tables.len(),
            station
        );
        Ok(tables)
    }
}

async fn decompress(archive: Vec<u8>, station: &str) -> Result<Vec<u8>, IrradianceDataError> {
    if !archive.starts_with(&GZIP_MAGIC) {
        debug!("Archive for station {} is not gzip, reading as plain tar", station);
        return Ok(archive);
    }
    let mut decoder = GzipDecoder::new(&archive[..]);
    let mut decompressed = Vec::with_capacity(archive.len() * 8);
    decoder
        .read_to_end(&mut decompressed)
        .await
        .map_err(|e| IrradianceDataError::ArchiveCorrupt {
            station: station.to_string(),
            source: e,
        })?;
    Ok(decompressed)
}

/// Reads the contents of the `wanted` entries in a single pass over the tar.
fn read_entries(
    tar_bytes: Vec<u8>,
    station: &str,
    wanted: &[(i32, String)],
) -> Result<HashMap<String, Vec<u8>>, IrradianceDataError> {
    let corrupt = |e: std::io::Error| IrradianceDataError::ArchiveCorrupt {
        station: station.to_string(),
        source: e,
    };

    let mut archive = tar::Archive::new(Cursor::new(tar_bytes));
    let mut found = HashMap::with_capacity(wanted.len());
    for entry in archive.entries().map_err(corrupt)? {
        let mut entry = entry.map_err(corrupt)?;
        let path = {
            let path = entry.path().map_err(corrupt)?;
            path.to_string_lossy().trim_start_matches("./").to_string()
        };
        if !wanted.iter().any(|(_, p)| *p == path) {
            continue;
        }
        let mut contents = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut contents).map_err(corrupt)?;
        found.insert(path, contents);
    }
    Ok(found)
}

/// Parses one headerless per-year CSV into typed rows.
///
/// Every cell is read as text so integer and fractional metric cells can be told
/// apart. A leading title row (first field not a date) is skipped.
fn parse_year_table(
    config: &SunshineConfig,
    station: &str,
    year: i32,
    bytes: Vec<u8>,
) -> Result<YearTable, IrradianceDataError> {
    let csv_error = |e: PolarsError| IrradianceDataError::CsvRead {
        station: station.to_string(),
        year,
        source: e,
    };

    let df = CsvReadOptions::default()
        .with_has_header(false)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|options| options.with_truncate_ragged_lines(true))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .map_err(csv_error)?;

    let width = config.max_column() + 1;
    if df.width() < width {
        return Err(IrradianceDataError::SchemaMismatch {
            station: station.to_string(),
            year,
            expected: width,
            found: df.width(),
        });
    }

    let columns = df.get_columns();
    let dates = columns[config.date_column].str().map_err(csv_error)?;
    let times = columns[config.time_column].str().map_err(csv_error)?;
    let metric_cells = config
        .metrics
        .iter()
        .map(|c| columns[c.column].str().map_err(csv_error))
        .collect::<Result<Vec<_>, _>>()?;

    let leap_day = YearTable::leap_day(year);
    let mut rows = Vec::with_capacity(df.height());
    let mut leap_rows = 0;

    for idx in 0..df.height() {
        // 1-based line number in the source file
        let line = idx + 1;
        let invalid = |column: usize, value: Option<&str>| IrradianceDataError::InvalidValue {
            station: station.to_string(),
            year,
            row: line,
            column,
            value: value.unwrap_or_default().to_string(),
        };

        let date = dates
            .get(idx)
            .map(str::trim)
            .ok_or_else(|| invalid(config.date_column, None))?;
        if idx == 0 && NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
            debug!("Skipping title row of {} {}: {}", station, year, date);
            continue;
        }
        if date == leap_day {
            leap_rows += 1;
            continue;
        }
        let time = times
            .get(idx)
            .map(str::trim)
            .ok_or_else(|| invalid(config.time_column, None))?;

        let values = config
            .metrics
            .iter()
            .zip(&metric_cells)
            .map(|(metric, cells)| {
                let cell = cells.get(idx);
                cell.and_then(parse_metric_value)
                    .ok_or_else(|| invalid(metric.column, cell))
            })
            .collect::<Result<Vec<f64>, _>>()?;

        rows.push(YearRow {
            date: date.to_string(),
            time: time.to_string(),
            values,
        });
    }

    debug!(
        "Parsed {} rows for station {} year {} ({} leap-day rows removed)",
        rows.len(),
        station,
        year,
        leap_rows
    );
    Ok(YearTable::new(year, rows))
}
