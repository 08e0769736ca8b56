use crate::irradiance_data::error::IrradianceDataError;
use crate::types::averaged::{AveragedDataset, AveragedRecord};
use crate::types::metric::Metric;
use crate::types::year_table::YearTable;
use log::debug;
use std::collections::BTreeMap;

/// Collapses several years of one station into a single year of averages.
///
/// Row `i` of every year is assumed to describe the same calendar day and time.
/// This holds for the NSRDB files once February 29th is removed, and is enforced
/// by equal row counts plus, when `verify_calendar` is set, by comparing the
/// month-day and time of every row across years.
#[derive(Debug, Clone)]
pub struct Averager {
    metrics: Vec<Metric>,
    verify_calendar: bool,
}

impl Averager {
    /// `metrics` gives the meaning of each position in [`crate::YearRow::values`].
    pub fn new(metrics: Vec<Metric>, verify_calendar: bool) -> Self {
        Self {
            metrics,
            verify_calendar,
        }
    }

    pub fn average(
        &self,
        station: &str,
        tables: &[YearTable],
    ) -> Result<AveragedDataset, IrradianceDataError> {
        let first = tables
            .first()
            .ok_or_else(|| IrradianceDataError::NoYearTables {
                station: station.to_string(),
            })?;
        let row_count = first.len();
        for table in tables {
            if table.len() != row_count {
                return Err(IrradianceDataError::RowCountMismatch {
                    station: station.to_string(),
                    year: table.year,
                    expected: row_count,
                    found: table.len(),
                });
            }
            if let Some((offset, row)) = table
                .rows
                .iter()
                .enumerate()
                .find(|(_, r)| r.values.len() != self.metrics.len())
            {
                return Err(IrradianceDataError::ValueCountMismatch {
                    station: station.to_string(),
                    year: table.year,
                    offset,
                    expected: self.metrics.len(),
                    found: row.values.len(),
                });
            }
        }
        if self.verify_calendar {
            self.verify_alignment(station, tables)?;
        }

        let year_count = tables.len() as f64;
        let mut records = Vec::with_capacity(row_count);
        for (offset, row) in first.rows.iter().enumerate() {
            let mut metrics = BTreeMap::new();
            for (position, metric) in self.metrics.iter().enumerate() {
                let sum: f64 = tables.iter().map(|t| t.rows[offset].values[position]).sum();
                metrics.insert(*metric, round_one_decimal(sum / year_count));
            }
            records.push(AveragedRecord {
                date_time: row.day_time_key(first.year),
                metrics,
            });
        }

        debug!(
            "Averaged {} rows over {} years for station {}",
            records.len(),
            tables.len(),
            station
        );
        AveragedDataset::new(station, self.metrics.clone(), records)
    }

    fn verify_alignment(
        &self,
        station: &str,
        tables: &[YearTable],
    ) -> Result<(), IrradianceDataError> {
        let Some((first, rest)) = tables.split_first() else {
            return Ok(());
        };
        for (offset, expected) in first.rows.iter().enumerate() {
            let expected_key = expected.day_time_key(first.year);
            for table in rest {
                let found_key = table.rows[offset].day_time_key(table.year);
                if found_key != expected_key {
                    return Err(IrradianceDataError::CalendarMismatch {
                        station: station.to_string(),
                        year: table.year,
                        offset,
                        expected: expected_key,
                        found: found_key,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Rounds to one decimal place based on the exact binary value, so `0.15`
/// (stored as `0.1499...`) becomes `0.1` and `0.45` becomes `0.5`. Exact ties
/// go to even.
pub fn round_one_decimal(value: f64) -> f64 {
    format!("{value:.1}").parse().unwrap_or(value)
}
