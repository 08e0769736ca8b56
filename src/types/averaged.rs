//! The year-averaged dataset of a station and its day/time keys.

use crate::irradiance_data::error::IrradianceDataError;
use crate::types::metric::Metric;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// A year-independent `MM-DD_HH:MM` key, e.g. `"01-01_17:00"`.
///
/// The NSRDB files use hour-ending timestamps, so `24:00` is a valid time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DayTimeKey(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid day/time key '{0}', expected MM-DD_HH:MM")]
pub struct InvalidDayTimeKey(pub String);

impl DayTimeKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn from_datetime(datetime: NaiveDateTime) -> Self {
        DayTimeKey(datetime.format("%m-%d_%H:%M").to_string())
    }
}

impl FromStr for DayTimeKey {
    type Err = InvalidDayTimeKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidDayTimeKey(s.to_string());
        let (day, time) = s.split_once('_').ok_or_else(invalid)?;
        let (month, day) = day.split_once('-').ok_or_else(invalid)?;
        let (hour, minute) = time.split_once(':').ok_or_else(invalid)?;

        let field = |v: &str, min: u32, max: u32| -> Result<u32, InvalidDayTimeKey> {
            if v.len() != 2 {
                return Err(invalid());
            }
            v.parse::<u32>()
                .ok()
                .filter(|n| (min..=max).contains(n))
                .ok_or_else(invalid)
        };
        field(month, 1, 12)?;
        field(day, 1, 31)?;
        field(hour, 0, 24)?;
        field(minute, 0, 59)?;

        Ok(DayTimeKey(s.to_string()))
    }
}

impl fmt::Display for DayTimeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<NaiveDateTime> for DayTimeKey {
    fn from(value: NaiveDateTime) -> Self {
        DayTimeKey::from_datetime(value)
    }
}

/// Multi-year averaged metrics of one day/time slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AveragedRecord {
    /// `MM-DD_HH:MM`
    pub date_time: String,
    pub metrics: BTreeMap<Metric, f64>,
}

impl AveragedRecord {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.metrics.get(&metric).copied()
    }
}

/// Every averaged day/time slot of a station, in file order.
///
/// Keys are unique; construction fails on a duplicate `date_time`.
#[derive(Debug, Clone, PartialEq)]
pub struct AveragedDataset {
    station: String,
    metrics: Vec<Metric>,
    records: Vec<AveragedRecord>,
    index: HashMap<String, usize>,
}

impl AveragedDataset {
    pub fn new(
        station: &str,
        metrics: Vec<Metric>,
        records: Vec<AveragedRecord>,
    ) -> Result<Self, IrradianceDataError> {
        let mut index = HashMap::with_capacity(records.len());
        for (offset, record) in records.iter().enumerate() {
            if index.insert(record.date_time.clone(), offset).is_some() {
                return Err(IrradianceDataError::DuplicateKey {
                    station: station.to_string(),
                    key: record.date_time.clone(),
                });
            }
        }
        Ok(Self {
            station: station.to_string(),
            metrics,
            records,
            index,
        })
    }

    pub fn station(&self) -> &str {
        &self.station
    }

    /// Metric columns in persisted order.
    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    pub fn records(&self) -> &[AveragedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&AveragedRecord> {
        self.index.get(key).map(|&offset| &self.records[offset])
    }
}
