use crate::geocode::error::GeocodeError;
use crate::irradiance_data::error::IrradianceDataError;
use crate::stations::error::LocateStationError;
use crate::types::averaged::InvalidDayTimeKey;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SunshineError {
    #[error(transparent)]
    Geocode(#[from] GeocodeError),

    #[error(transparent)]
    LocateStation(#[from] LocateStationError),

    #[error(transparent)]
    IrradianceData(#[from] IrradianceDataError),

    #[error(transparent)]
    InvalidDayTimeKey(#[from] InvalidDayTimeKey),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to determine cache directory")]
    CacheDirResolution(#[source] std::io::Error),
}
