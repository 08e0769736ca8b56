use crate::stations::error::LocateStationError;
use crate::types::location::LatLon;
use crate::types::station::StationRecord;
use haversine::{distance, Location as HaversineLocation, Units};
use log::info;
use ordered_float::OrderedFloat;
use polars::prelude::*;
use rstar::RTree;
use std::path::Path;

const COL_CODE: &str = "code";
const COL_LAT: &str = "lat";
const COL_LNG: &str = "lng";

/// Immutable nearest-neighbor index over the stations of the mapping table.
///
/// Backed by a bulk-loaded R-tree: building costs O(n log n), a nearest query
/// O(log n) on average. Distances are planar Euclidean over raw `(lat, lon)`.
/// When several stations are equally near, the one reached first by the
/// R-tree's nearest-neighbor traversal is returned.
#[derive(Debug, Clone)]
pub struct StationIndex {
    rtree: RTree<StationRecord>,
}

impl StationIndex {
    pub fn build(stations: Vec<StationRecord>) -> Result<Self, LocateStationError> {
        if stations.is_empty() {
            return Err(LocateStationError::NoStations);
        }
        Ok(StationIndex {
            rtree: RTree::bulk_load(stations),
        })
    }

    /// Reads the mapping table at `path` and builds the index from it.
    pub async fn load(path: &Path) -> Result<Self, LocateStationError> {
        let load_start = std::time::Instant::now();
        let path_buf = path.to_path_buf();
        let stations = tokio::task::spawn_blocking(move || read_mapping(&path_buf)).await??;
        info!(
            "Loaded {} stations from {} in {:?}",
            stations.len(),
            path.display(),
            load_start.elapsed()
        );
        Self::build(stations)
    }

    pub fn len(&self) -> usize {
        self.rtree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.rtree.size() == 0
    }

    pub fn get(&self, code: &str) -> Option<&StationRecord> {
        self.rtree.iter().find(|s| s.code == code)
    }

    /// The station closest to `location` by planar distance.
    pub fn nearest(&self, location: LatLon) -> Result<&StationRecord, LocateStationError> {
        self.rtree
            .nearest_neighbor(&location.as_point())
            .ok_or(LocateStationError::NoStations)
    }

    /// Up to `n_results` stations near `location` with their great-circle distance
    /// in km, closest first.
    ///
    /// Candidates come from the planar R-tree order, so a few extra are taken
    /// before re-sorting by Haversine distance.
    pub fn nearest_stations(&self, location: LatLon, n_results: usize) -> Vec<(StationRecord, f64)> {
        if n_results == 0 {
            return vec![];
        }
        let candidate_limit = (n_results * 2).max(20);

        let mut stations_with_dist: Vec<(StationRecord, f64)> = self
            .rtree
            .nearest_neighbor_iter(&location.as_point())
            .take(candidate_limit)
            .map(|station| {
                let dist_km = distance(
                    HaversineLocation {
                        latitude: location.latitude(),
                        longitude: location.longitude(),
                    },
                    HaversineLocation {
                        latitude: station.lat,
                        longitude: station.lon,
                    },
                    Units::Kilometers,
                );
                (station.to_owned(), dist_km)
            })
            .collect();

        stations_with_dist.sort_by_key(|(_, dist)| OrderedFloat(*dist));
        stations_with_dist.truncate(n_results);
        stations_with_dist
    }
}

/// Parses the `code,lat,lng` mapping table. Every column is read as text so
/// station codes keep leading zeros.
fn read_mapping(path: &Path) -> Result<Vec<StationRecord>, LocateStationError> {
    std::fs::metadata(path).map_err(|e| LocateStationError::MappingRead(path.to_path_buf(), e))?;

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| LocateStationError::MappingParse(path.to_path_buf(), e))?
        .finish()
        .map_err(|e| LocateStationError::MappingParse(path.to_path_buf(), e))?;

    let text_column = |name: &str| -> Result<StringChunked, LocateStationError> {
        let column = df
            .column(name)
            .map_err(|_| LocateStationError::MissingColumn {
                path: path.to_path_buf(),
                column: name.to_string(),
            })?;
        column
            .str()
            .cloned()
            .map_err(|e| LocateStationError::MappingParse(path.to_path_buf(), e))
    };
    let codes = text_column(COL_CODE)?;
    let lats = text_column(COL_LAT)?;
    let lngs = text_column(COL_LNG)?;

    let invalid = |row: usize, reason: String| LocateStationError::InvalidRow {
        path: path.to_path_buf(),
        row,
        reason,
    };

    let mut stations = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        // 1-based data row, header excluded
        let row = idx + 1;
        let code = codes
            .get(idx)
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| invalid(row, "missing station code".to_string()))?;
        let coordinate = |values: &StringChunked, name: &str| -> Result<f64, LocateStationError> {
            let raw = values
                .get(idx)
                .ok_or_else(|| invalid(row, format!("missing {name}")))?;
            raw.trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| invalid(row, format!("{name} '{raw}' is not a number")))
        };
        let lat = coordinate(&lats, COL_LAT)?;
        let lon = coordinate(&lngs, COL_LNG)?;
        stations.push(StationRecord::new(code, lat, lon));
    }

    if stations.is_empty() {
        return Err(LocateStationError::EmptyMapping(path.to_path_buf()));
    }
    Ok(stations)
}
