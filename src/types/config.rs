//! Configuration of the data sources, the year range and the file layout.

use crate::error::SunshineError;
use crate::types::metric::{Metric, MetricColumn};
use crate::utils::get_cache_dir;
use bon::Builder;
use std::path::PathBuf;

/// NCEI bulk location of the NSRDB 1991-2005 solar-only station archives.
pub const DEFAULT_ARCHIVE_BASE_URL: &str =
    "https://www.ncei.noaa.gov/pub/data/nsrdb-solar/solar-only/";
pub const DEFAULT_ARCHIVE_EXTENSION: &str = "tar.gz";
pub const DEFAULT_ENTRY_PREFIX: &str = "nsrdb_solar";
pub const DEFAULT_ENTRY_EXTENSION: &str = "csv";
pub const DEFAULT_FIRST_YEAR: i32 = 1995;
pub const DEFAULT_LAST_YEAR: i32 = 2005;

/// Everything the pipeline needs to know about where data lives and how it is laid out.
///
/// Only `mapping_path` is required; all other fields default to the NSRDB layout.
///
/// # Examples
///
/// ```
/// use sunshine::SunshineConfig;
///
/// let config = SunshineConfig::builder()
///     .mapping_path("data/stations.csv")
///     .cache_dir("/tmp/sunshine")
///     .years((2000..=2004).collect())
///     .build();
///
/// assert_eq!(config.years.len(), 5);
/// assert_eq!(config.archive_url("725090"),
///     "https://www.ncei.noaa.gov/pub/data/nsrdb-solar/solar-only/725090.tar.gz");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Builder)]
pub struct SunshineConfig {
    /// Station mapping table, a CSV with `code`, `lat` and `lng` columns.
    #[builder(into)]
    pub mapping_path: PathBuf,
    /// Directory holding the averaged `<station>.csv` files. Defaults to the
    /// system cache directory.
    #[builder(into)]
    pub cache_dir: Option<PathBuf>,
    #[builder(into, default = DEFAULT_ARCHIVE_BASE_URL.to_string())]
    pub archive_base_url: String,
    #[builder(into, default = DEFAULT_ARCHIVE_EXTENSION.to_string())]
    pub archive_extension: String,
    /// First path component of every entry inside the archive.
    #[builder(into, default = DEFAULT_ENTRY_PREFIX.to_string())]
    pub entry_prefix: String,
    #[builder(into, default = DEFAULT_ENTRY_EXTENSION.to_string())]
    pub entry_extension: String,
    /// Years to average, in order. Must be consecutive.
    #[builder(default = (DEFAULT_FIRST_YEAR..=DEFAULT_LAST_YEAR).collect())]
    pub years: Vec<i32>,
    #[builder(default = 0)]
    pub date_column: usize,
    #[builder(default = 1)]
    pub time_column: usize,
    #[builder(default = MetricColumn::defaults())]
    pub metrics: Vec<MetricColumn>,
    /// Check that every year agrees on the month-day and time at each row offset.
    #[builder(default = true)]
    pub verify_calendar: bool,
}

impl SunshineConfig {
    pub fn validate(&self) -> Result<(), SunshineError> {
        if self.years.is_empty() {
            return Err(SunshineError::InvalidConfig(
                "at least one year is required".to_string(),
            ));
        }
        if self.years.windows(2).any(|w| w[1] != w[0] + 1) {
            return Err(SunshineError::InvalidConfig(format!(
                "years must be consecutive and ascending, got {:?}",
                self.years
            )));
        }
        if self.metrics.is_empty() {
            return Err(SunshineError::InvalidConfig(
                "at least one metric is required".to_string(),
            ));
        }
        let mut seen = Vec::with_capacity(self.metrics.len());
        for column in &self.metrics {
            if seen.contains(&column.metric) {
                return Err(SunshineError::InvalidConfig(format!(
                    "metric {} is configured twice",
                    column.metric
                )));
            }
            seen.push(column.metric);
        }
        Ok(())
    }

    /// The cache directory, falling back to the system cache directory.
    pub fn resolve_cache_dir(&self) -> Result<PathBuf, SunshineError> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => get_cache_dir().map_err(SunshineError::CacheDirResolution),
        }
    }

    /// `<base><station>.<ext>`
    pub fn archive_url(&self, station: &str) -> String {
        format!(
            "{}{}.{}",
            self.archive_base_url, station, self.archive_extension
        )
    }

    /// `<prefix>/<station>/<station>_<year>.<ext>`
    pub fn entry_path(&self, station: &str, year: i32) -> String {
        format!(
            "{}/{}/{}_{}.{}",
            self.entry_prefix, station, station, year, self.entry_extension
        )
    }

    pub fn metric_order(&self) -> Vec<Metric> {
        self.metrics.iter().map(|c| c.metric).collect()
    }

    /// Highest zero-based column any configured field is read from.
    pub(crate) fn max_column(&self) -> usize {
        self.metrics
            .iter()
            .map(|c| c.column)
            .chain([self.date_column, self.time_column])
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SunshineConfig {
        SunshineConfig::builder().mapping_path("stations.csv").build()
    }

    #[test]
    fn test_defaults_follow_nsrdb_layout() {
        let config = config();
        assert_eq!(config.years, (1995..=2005).collect::<Vec<_>>());
        assert_eq!(config.years.len(), 11);
        assert_eq!(
            config.entry_path("725090", 1995),
            "nsrdb_solar/725090/725090_1995.csv"
        );
        assert_eq!(
            config.metric_order(),
            [Metric::Zenith, Metric::Azimuth, Metric::Etr, Metric::Etrn]
        );
        assert_eq!(config.max_column(), 5);
        assert!(config.verify_calendar);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_years() {
        let mut config = config();
        config.years = vec![];
        assert!(matches!(config.validate(), Err(SunshineError::InvalidConfig(_))));

        config.years = vec![1995, 1997];
        assert!(matches!(config.validate(), Err(SunshineError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_duplicate_metric() {
        let mut config = config();
        config.metrics.push(MetricColumn::new(Metric::Etr, 7));
        assert!(matches!(config.validate(), Err(SunshineError::InvalidConfig(_))));
    }

    #[test]
    fn test_explicit_cache_dir_wins() {
        let config = SunshineConfig::builder()
            .mapping_path("stations.csv")
            .cache_dir("/tmp/sunshine-test")
            .build();
        assert_eq!(
            config.resolve_cache_dir().unwrap(),
            PathBuf::from("/tmp/sunshine-test")
        );
    }
}
