//! Defines the data structure representing an irradiance measurement station as
//! listed in the station mapping table. Also includes the implementations
//! necessary for spatial indexing using the `rstar` crate.

use crate::types::location::LatLon;
use rstar::{PointDistance, RTreeObject, AABB};
use serde::{Deserialize, Serialize};

/// A single solar irradiance station from the mapping table.
///
/// Stations are identified by their code (e.g. `"725090"` for Boston Logan) and
/// located by latitude/longitude in decimal degrees.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StationRecord {
    /// The station code, used to address the remote archive and the cache file.
    pub code: String,
    /// Latitude in decimal degrees (positive for North, negative for South).
    pub lat: f64,
    /// Longitude in decimal degrees (positive for East, negative for West).
    pub lon: f64,
}

impl StationRecord {
    pub fn new(code: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            code: code.into(),
            lat,
            lon,
        }
    }

    pub fn location(&self) -> LatLon {
        LatLon(self.lat, self.lon)
    }
}

// --- R-Tree Implementations ---

/// A station is a point object in (latitude, longitude) space.
impl RTreeObject for StationRecord {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.lat, self.lon])
    }
}

impl PointDistance for StationRecord {
    /// Squared planar Euclidean distance between the station and `[lat, lon]`.
    ///
    /// Latitude and longitude are treated as Cartesian coordinates. This is not a
    /// geodesic distance; nearest-station resolution is defined on this metric.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.lat - point[0];
        let dy = self.lon - point[1];
        dx * dx + dy * dy
    }
}
