//! Geographical coordinates as used throughout the crate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
/// Both values are represented as `f64`.
///
/// # Examples
///
/// ```
/// use sunshine::LatLon;
///
/// let mit = LatLon(42.3592962, -71.09308333242714);
/// assert_eq!(mit.0, 42.3592962); // Latitude
/// assert_eq!(mit.1, -71.09308333242714); // Longitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon(pub f64, pub f64);

impl LatLon {
    pub fn latitude(&self) -> f64 {
        self.0
    }

    pub fn longitude(&self) -> f64 {
        self.1
    }

    /// The point as used by the station R-tree: `[lat, lon]`.
    pub(crate) fn as_point(&self) -> [f64; 2] {
        [self.0, self.1]
    }
}

impl fmt::Display for LatLon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.0, self.1)
    }
}
