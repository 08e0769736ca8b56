use crate::irradiance_data::error::IrradianceDataError;
use crate::types::averaged::{AveragedDataset, AveragedRecord};
use crate::types::metric::Metric;
use log::{info, warn};
use polars::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tokio::{fs, task};

const COL_DATE_TIME: &str = "date_time";

/// Persists the averaged dataset of each station as `<cache_dir>/<station>.csv`.
///
/// Builds for the same station are serialized, and every dataset loaded or built
/// is kept in memory for the lifetime of the cache. Files are written to a
/// temporary file in the cache directory and renamed into place, so a failed or
/// interrupted build never leaves a partial artifact.
pub struct StationCache {
    cache_dir: PathBuf,
    metrics: Vec<Metric>,
    datasets: Mutex<HashMap<String, Arc<AveragedDataset>>>,
    build_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl StationCache {
    /// `metrics` is the column set expected in every artifact.
    pub fn new(cache_dir: &Path, metrics: Vec<Metric>) -> Self {
        Self {
            cache_dir: cache_dir.to_path_buf(),
            metrics,
            datasets: Mutex::new(HashMap::new()),
            build_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn artifact_path(&self, station: &str) -> PathBuf {
        self.cache_dir.join(format!("{station}.csv"))
    }

    /// Returns the dataset of `station`, running `builder` only when no artifact exists.
    pub async fn get_or_build<F, Fut>(
        &self,
        station: &str,
        builder: F,
    ) -> Result<Arc<AveragedDataset>, IrradianceDataError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<AveragedDataset, IrradianceDataError>>,
    {
        if let Some(dataset) = self.datasets.lock().await.get(station) {
            return Ok(dataset.clone());
        }

        let station_lock = self.station_lock(station).await;
        let _guard = station_lock.lock().await;

        // Another caller may have finished while we waited for the lock.
        if let Some(dataset) = self.datasets.lock().await.get(station) {
            return Ok(dataset.clone());
        }

        let path = self.artifact_path(station);
        let dataset = if fs::metadata(&path).await.is_ok() {
            info!("Cache hit for station {} at {:?}", station, path);
            self.load(station, &path).await?
        } else {
            warn!(
                "Cache miss for station {}. Downloading and averaging.",
                station
            );
            let dataset = builder().await?;
            fs::create_dir_all(&self.cache_dir)
                .await
                .map_err(|e| IrradianceDataError::CacheDirCreation(self.cache_dir.clone(), e))?;
            persist(&dataset, &self.cache_dir, &path).await?;
            info!(
                "Cached {} averaged rows for station {} to {:?}",
                dataset.len(),
                station,
                path
            );
            dataset
        };

        let dataset = Arc::new(dataset);
        self.datasets
            .lock()
            .await
            .insert(station.to_string(), dataset.clone());
        Ok(dataset)
    }

    /// Forgets the dataset of `station` and deletes its artifact, if any.
    pub async fn invalidate(&self, station: &str) -> Result<(), IrradianceDataError> {
        let station_lock = self.station_lock(station).await;
        let _guard = station_lock.lock().await;

        self.datasets.lock().await.remove(station);
        let path = self.artifact_path(station);
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!("Removed cache file {:?}", path);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(IrradianceDataError::CacheDeletion(path, e)),
        }
    }

    async fn station_lock(&self, station: &str) -> Arc<Mutex<()>> {
        self.build_locks
            .lock()
            .await
            .entry(station.to_string())
            .or_default()
            .clone()
    }

    async fn load(
        &self,
        station: &str,
        path: &Path,
    ) -> Result<AveragedDataset, IrradianceDataError> {
        let path_buf = path.to_path_buf();
        let station_owned = station.to_string();
        let expected = self.metrics.clone();
        task::spawn_blocking(move || read_artifact(&station_owned, &path_buf, &expected)).await?
    }
}

/// Writes `dataset` to a temporary file next to `path`, then renames it over `path`.
async fn persist(
    dataset: &AveragedDataset,
    cache_dir: &Path,
    path: &Path,
) -> Result<(), IrradianceDataError> {
    let mut columns = Vec::with_capacity(dataset.metrics().len() + 1);
    let keys: Vec<&str> = dataset
        .records()
        .iter()
        .map(|r| r.date_time.as_str())
        .collect();
    columns.push(Column::new(COL_DATE_TIME.into(), keys));
    for metric in dataset.metrics() {
        let values: Vec<f64> = dataset
            .records()
            .iter()
            .map(|r| r.get(*metric).unwrap_or(f64::NAN))
            .collect();
        columns.push(Column::new(metric.name().into(), values));
    }
    let mut df = DataFrame::new(columns)
        .map_err(|e| IrradianceDataError::CacheEncode(path.to_path_buf(), e))?;

    let dir = cache_dir.to_path_buf();
    let path_buf = path.to_path_buf();
    task::spawn_blocking(move || {
        let mut temp_file = NamedTempFile::new_in(&dir)
            .map_err(|e| IrradianceDataError::CacheWrite(path_buf.clone(), e))?;
        CsvWriter::new(temp_file.as_file_mut())
            .include_header(true)
            .finish(&mut df)
            .map_err(|e| IrradianceDataError::CacheEncode(path_buf.clone(), e))?;
        temp_file
            .as_file()
            .sync_all()
            .map_err(|e| IrradianceDataError::CacheWrite(path_buf.clone(), e))?;
        temp_file
            .persist(&path_buf)
            .map_err(|e| IrradianceDataError::CacheWrite(path_buf.clone(), e.error))?;
        Ok::<(), IrradianceDataError>(())
    })
    .await??;
    Ok(())
}

/// Reads an artifact back. The header must be `date_time` followed by exactly the
/// `expected` metrics, in any order.
fn read_artifact(
    station: &str,
    path: &Path,
    expected: &[Metric],
) -> Result<AveragedDataset, IrradianceDataError> {
    let decode = |message: String| IrradianceDataError::CacheDecode {
        path: path.to_path_buf(),
        message,
    };

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| IrradianceDataError::CacheRead(path.to_path_buf(), e))?
        .finish()
        .map_err(|e| IrradianceDataError::CacheRead(path.to_path_buf(), e))?;

    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    if names.first().map(String::as_str) != Some(COL_DATE_TIME) {
        return Err(decode(format!(
            "first column must be '{COL_DATE_TIME}', found {names:?}"
        )));
    }
    let metrics = names[1..]
        .iter()
        .map(|n| n.parse::<Metric>().map_err(|e| decode(e.to_string())))
        .collect::<Result<Vec<_>, _>>()?;
    let mut sorted = metrics.clone();
    sorted.sort();
    let mut wanted = expected.to_vec();
    wanted.sort();
    if sorted != wanted {
        return Err(decode(format!(
            "columns {metrics:?} do not match configured metrics {expected:?}"
        )));
    }

    let columns = df.get_columns();
    let text = |idx: usize| {
        columns[idx]
            .str()
            .map_err(|e| IrradianceDataError::CacheRead(path.to_path_buf(), e))
    };
    let keys = text(0)?;
    let metric_cells = (1..columns.len()).map(text).collect::<Result<Vec<_>, _>>()?;

    let mut records = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let date_time = keys
            .get(idx)
            .ok_or_else(|| decode(format!("row {} has no date_time", idx + 1)))?;
        let mut values = BTreeMap::new();
        for (metric, cells) in metrics.iter().zip(&metric_cells) {
            let value = cells
                .get(idx)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .ok_or_else(|| decode(format!("row {} has an invalid {metric}", idx + 1)))?;
            values.insert(*metric, value);
        }
        records.push(AveragedRecord {
            date_time: date_time.to_string(),
            metrics: values,
        });
    }

    AveragedDataset::new(station, metrics, records)
}
