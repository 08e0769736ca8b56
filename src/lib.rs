mod error;
mod geocode;
mod irradiance_data;
mod stations;
mod sunshine;
mod types;
mod utils;

#[cfg(test)]
mod test_support;

pub use error::SunshineError;
pub use sunshine::*;

pub use geocode::error::GeocodeError;
pub use geocode::geocoder::{Geocoder, StaticGeocoder};
pub use geocode::nominatim::NominatimGeocoder;

pub use stations::error::LocateStationError;
pub use stations::station_index::StationIndex;

pub use irradiance_data::averager::{round_one_decimal, Averager};
pub use irradiance_data::cache::StationCache;
pub use irradiance_data::error::IrradianceDataError;
pub use irradiance_data::extractor::ArchiveExtractor;
pub use irradiance_data::fetcher::ArchiveFetcher;
pub use irradiance_data::query::{lookup, lookup_at};

pub use types::averaged::{AveragedDataset, AveragedRecord, DayTimeKey, InvalidDayTimeKey};
pub use types::config::SunshineConfig;
pub use types::location::LatLon;
pub use types::metric::{Metric, MetricColumn, UnknownMetric};
pub use types::station::StationRecord;
pub use types::year_table::{YearRow, YearTable};
