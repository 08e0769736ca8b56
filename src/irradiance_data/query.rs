use crate::irradiance_data::error::IrradianceDataError;
use crate::types::averaged::{AveragedDataset, AveragedRecord, DayTimeKey};
use chrono::NaiveDateTime;

/// Returns the record whose key is exactly `key` (`MM-DD_HH:MM`).
pub fn lookup<'a>(
    dataset: &'a AveragedDataset,
    key: &str,
) -> Result<&'a AveragedRecord, IrradianceDataError> {
    dataset
        .get(key)
        .ok_or_else(|| IrradianceDataError::DataNotFound {
            station: dataset.station().to_string(),
            key: key.to_string(),
        })
}

/// Like [`lookup`], keyed by the month, day, hour and minute of `datetime`.
pub fn lookup_at(
    dataset: &AveragedDataset,
    datetime: NaiveDateTime,
) -> Result<&AveragedRecord, IrradianceDataError> {
    lookup(dataset, DayTimeKey::from_datetime(datetime).as_str())
}
