//! Defines the irradiance metrics tracked per day/time slot and the column
//! layout used to read them from the per-year station files.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A metric column of the NSRDB solar station files.
///
/// The declaration order is also the default column order of the cache file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Metric {
    /// Solar zenith angle, in degrees.
    Zenith,
    /// Solar azimuth angle, in degrees.
    Azimuth,
    /// Extraterrestrial radiation on a horizontal surface (W/m²).
    Etr,
    /// Extraterrestrial radiation normal to the sun (W/m²).
    Etrn,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::Zenith, Metric::Azimuth, Metric::Etr, Metric::Etrn];

    /// Column header used in the cache file and in query results.
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Zenith => "ZENITH",
            Metric::Azimuth => "AZIMUTH",
            Metric::Etr => "ETR",
            Metric::Etrn => "ETRN",
        }
    }

    /// Zero-based position of the metric in a raw per-year station file.
    pub fn default_column(&self) -> usize {
        match self {
            Metric::Zenith => 2,
            Metric::Azimuth => 3,
            Metric::Etr => 4,
            Metric::Etrn => 5,
        }
    }
}

/// Formats a `Metric` using its column header.
///
/// # Examples
///
/// ```
/// use sunshine::Metric;
///
/// assert_eq!(Metric::Etrn.to_string(), "ETRN");
/// ```
impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown metric '{0}'")]
pub struct UnknownMetric(pub String);

impl FromStr for Metric {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownMetric(s.to_string()))
    }
}

/// Binds a metric to its zero-based column in the raw per-year files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricColumn {
    pub metric: Metric,
    pub column: usize,
}

impl MetricColumn {
    pub fn new(metric: Metric, column: usize) -> Self {
        Self { metric, column }
    }

    /// The four NSRDB metrics at their standard positions (2..=5).
    pub fn defaults() -> Vec<MetricColumn> {
        Metric::ALL
            .into_iter()
            .map(|metric| MetricColumn::new(metric, metric.default_column()))
            .collect()
    }
}
