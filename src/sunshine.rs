//! The main entry point: address in, averaged solar record out.
//!
//! A [`Sunshine`] client owns the station index, the download and parsing
//! pipeline, and the on-disk cache of averaged station datasets.

use crate::error::SunshineError;
use crate::geocode::geocoder::Geocoder;
use crate::geocode::nominatim::NominatimGeocoder;
use crate::irradiance_data::averager::Averager;
use crate::irradiance_data::cache::StationCache;
use crate::irradiance_data::extractor::ArchiveExtractor;
use crate::irradiance_data::fetcher::ArchiveFetcher;
use crate::irradiance_data::query::lookup;
use crate::stations::station_index::StationIndex;
use crate::types::averaged::{AveragedDataset, AveragedRecord, DayTimeKey};
use crate::types::config::SunshineConfig;
use crate::types::location::LatLon;
use crate::types::station::StationRecord;
use crate::utils::ensure_cache_dir_exists;
use bon::bon;
use log::info;
use serde::Serialize;
use std::sync::Arc;

/// Everything a query resolved along the way, plus the record itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SunshineReport {
    /// Coordinate the address resolved to (or the coordinate that was passed in).
    pub location: LatLon,
    /// Station nearest to `location`.
    pub station: StationRecord,
    /// Averaged values at the requested day and time.
    pub record: AveragedRecord,
}

/// Client for multi-year averaged NSRDB solar data.
///
/// Averaged datasets are built once per station and cached in
/// [`SunshineConfig::cache_dir`]; later queries for the same station neither
/// download nor parse anything.
///
/// # Examples
///
/// ```no_run
/// # use sunshine::{Sunshine, SunshineConfig, SunshineError, NominatimGeocoder};
/// # #[tokio::main]
/// # async fn main() -> Result<(), SunshineError> {
/// let config = SunshineConfig::builder()
///     .mapping_path("data/station_mapping.csv")
///     .build();
/// let client = Sunshine::new(config, NominatimGeocoder::new()).await?;
///
/// let report = client
///     .query()
///     .address("77 Massachusetts Ave, Cambridge, MA 02139, United States")
///     .day_time("01-01_17:00")
///     .call()
///     .await?;
/// println!("{} -> {:?}", report.station.code, report.record.metrics);
/// # Ok(())
/// # }
/// ```
pub struct Sunshine<G: Geocoder = NominatimGeocoder> {
    config: SunshineConfig,
    index: StationIndex,
    fetcher: ArchiveFetcher,
    extractor: ArchiveExtractor,
    averager: Averager,
    cache: StationCache,
    geocoder: G,
}

#[bon]
impl<G: Geocoder> Sunshine<G> {
    /// Validates `config`, prepares the cache directory and loads the station mapping.
    ///
    /// # Errors
    ///
    /// Returns [`SunshineError::InvalidConfig`] for an unusable configuration,
    /// [`SunshineError::CacheDirResolution`] / [`SunshineError::CacheDirCreation`]
    /// when the cache directory is unavailable, and [`SunshineError::LocateStation`]
    /// when the mapping table cannot be loaded.
    pub async fn new(config: SunshineConfig, geocoder: G) -> Result<Self, SunshineError> {
        config.validate()?;
        let cache_dir = config.resolve_cache_dir()?;
        ensure_cache_dir_exists(&cache_dir)
            .await
            .map_err(|e| SunshineError::CacheDirCreation(cache_dir.clone(), e))?;
        let index = StationIndex::load(&config.mapping_path).await?;
        info!(
            "Sunshine ready: {} stations, cache at {}",
            index.len(),
            cache_dir.display()
        );

        Ok(Self {
            fetcher: ArchiveFetcher::new(&config),
            extractor: ArchiveExtractor::new(&config),
            averager: Averager::new(config.metric_order(), config.verify_calendar),
            cache: StationCache::new(&cache_dir, config.metric_order()),
            index,
            geocoder,
            config,
        })
    }

    pub fn config(&self) -> &SunshineConfig {
        &self.config
    }

    pub fn stations(&self) -> &StationIndex {
        &self.index
    }

    /// Resolves an address through the configured geocoder.
    pub async fn locate(&self, address: &str) -> Result<LatLon, SunshineError> {
        Ok(self.geocoder.resolve(address).await?)
    }

    pub fn nearest_station(&self, location: LatLon) -> Result<&StationRecord, SunshineError> {
        Ok(self.index.nearest(location)?)
    }

    /// Returns the averaged dataset of `station`, downloading, parsing and
    /// averaging its archive on first use.
    ///
    /// Nothing is written to the cache when any step fails.
    pub async fn station_dataset(
        &self,
        station: &str,
    ) -> Result<Arc<AveragedDataset>, SunshineError> {
        let dataset = self
            .cache
            .get_or_build(station, move || async move {
                let archive = self.fetcher.fetch(station).await?;
                let tables = self
                    .extractor
                    .extract(archive, station, &self.config.years)
                    .await?;
                self.averager.average(station, &tables)
            })
            .await?;
        Ok(dataset)
    }

    /// Looks up the averaged record at `day_time` (`MM-DD_HH:MM`) for the station
    /// nearest to `address`.
    ///
    /// # Errors
    ///
    /// Returns [`SunshineError::InvalidDayTimeKey`] for a malformed key before any
    /// lookup happens, [`crate::GeocodeError::AddressNotFound`] (wrapped) for an
    /// unknown address and [`crate::IrradianceDataError::DataNotFound`] (wrapped)
    /// when the key has no record. Keys must match exactly.
    #[builder]
    pub async fn query(
        &self,
        address: &str,
        day_time: &str,
    ) -> Result<SunshineReport, SunshineError> {
        day_time.parse::<DayTimeKey>()?;
        let location = self.locate(address).await?;
        self.query_location()
            .location(location)
            .day_time(day_time)
            .call()
            .await
    }

    /// Like [`Sunshine::query`], starting from a coordinate.
    #[builder]
    pub async fn query_location(
        &self,
        location: LatLon,
        day_time: &str,
    ) -> Result<SunshineReport, SunshineError> {
        let key: DayTimeKey = day_time.parse()?;
        let station = self.nearest_station(location)?.clone();
        info!("Nearest station to {} is {}", location, station.code);
        let dataset = self.station_dataset(&station.code).await?;
        let record = lookup(&dataset, key.as_str())?.clone();
        Ok(SunshineReport {
            location,
            station,
            record,
        })
    }

    /// Drops the cached dataset of `station`, in memory and on disk.
    pub async fn invalidate(&self, station: &str) -> Result<(), SunshineError> {
        Ok(self.cache.invalidate(station).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocode::error::GeocodeError;
    use crate::geocode::geocoder::StaticGeocoder;
    use crate::irradiance_data::error::IrradianceDataError;
    use crate::test_support::{serve, station_archive, StubServer};
    use crate::types::metric::Metric;
    use std::path::Path;
    use tempfile::TempDir;

    const MIT: &str = "77 Massachusetts Ave, Cambridge, MA 02139, United States";
    const MAPPING: &str = concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/station_mapping.csv"
    );

    fn config(server: &StubServer, cache_dir: &Path) -> SunshineConfig {
        SunshineConfig::builder()
            .mapping_path(MAPPING)
            .cache_dir(cache_dir)
            .archive_base_url(server.base_url.clone())
            .years(vec![1995, 1996, 1997])
            .build()
    }

    fn geocoder() -> StaticGeocoder {
        StaticGeocoder::new().with_address(MIT, LatLon(42.3592962, -71.09308333242714))
    }

    async fn client(
        server: &StubServer,
        cache_dir: &Path,
    ) -> Result<Sunshine<StaticGeocoder>, SunshineError> {
        Sunshine::new(config(server, cache_dir), geocoder()).await
    }

    fn assert_mit_record(record: &AveragedRecord) {
        assert_eq!(record.date_time, "01-01_17:00");
        assert_eq!(record.get(Metric::Zenith), Some(88.6));
        assert_eq!(record.get(Metric::Azimuth), Some(237.0));
        assert_eq!(record.get(Metric::Etr), Some(11.6));
        assert_eq!(record.get(Metric::Etrn), Some(480.9));
    }

    #[tokio::test]
    async fn test_query_address_end_to_end() -> Result<(), SunshineError> {
        let archive = station_archive("725090", &[1995, 1996, 1997], &[1, 17]).await;
        let server = serve(200, archive).await;
        let cache_dir = TempDir::new().unwrap();
        let client = client(&server, cache_dir.path()).await?;

        let report = client.query().address(MIT).day_time("01-01_17:00").call().await?;
        assert_eq!(report.location, LatLon(42.3592962, -71.09308333242714));
        assert_eq!(report.station.code, "725090");
        assert_mit_record(&report.record);
        assert_eq!(server.last_path().as_deref(), Some("/725090.tar.gz"));
        assert!(cache_dir.path().join("725090.csv").exists());

        let again = client.query().address(MIT).day_time("01-01_17:00").call().await?;
        assert_eq!(again, report);
        assert_eq!(server.hits(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_cached_artifact_survives_new_client() -> Result<(), SunshineError> {
        let archive = station_archive("725090", &[1995, 1996, 1997], &[1, 17]).await;
        let server = serve(200, archive).await;
        let cache_dir = TempDir::new().unwrap();

        let first = client(&server, cache_dir.path()).await?;
        let built = first.station_dataset("725090").await?;

        let second = client(&server, cache_dir.path()).await?;
        let loaded = second.station_dataset("725090").await?;
        assert_eq!(server.hits(), 1);
        assert_eq!(loaded.len(), built.len());
        assert_eq!(loaded.records(), built.records());
        // Leap-day rows are gone: 365 days of two samples each.
        assert_eq!(loaded.len(), 730);
        assert!(loaded.get("02-29_01:00").is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_address() -> Result<(), SunshineError> {
        let server = serve(200, Vec::new()).await;
        let cache_dir = TempDir::new().unwrap();
        let client = client(&server, cache_dir.path()).await?;

        let result = client
            .query()
            .address("1 Nowhere Lane")
            .day_time("01-01_17:00")
            .call()
            .await;
        assert!(matches!(
            result,
            Err(SunshineError::Geocode(GeocodeError::AddressNotFound(_)))
        ));
        assert_eq!(server.hits(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_day_time() -> Result<(), SunshineError> {
        let archive = station_archive("725090", &[1995, 1996, 1997], &[1, 17]).await;
        let server = serve(200, archive).await;
        let cache_dir = TempDir::new().unwrap();
        let client = client(&server, cache_dir.path()).await?;

        let result = client
            .query_location()
            .location(LatLon(42.36, -71.09))
            .day_time("01-01_17:30")
            .call()
            .await;
        match result {
            Err(SunshineError::IrradianceData(IrradianceDataError::DataNotFound { station, key })) => {
                assert_eq!(station, "725090");
                assert_eq!(key, "01-01_17:30");
            }
            other => panic!("expected DataNotFound, got {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_day_time_rejected_before_download() -> Result<(), SunshineError> {
        let server = serve(200, Vec::new()).await;
        let cache_dir = TempDir::new().unwrap();
        let client = client(&server, cache_dir.path()).await?;

        for day_time in ["1-1_17:00", "01-01 17:00", "13-01_17:00", "01-01_17:60"] {
            let result = client.query().address(MIT).day_time(day_time).call().await;
            assert!(
                matches!(result, Err(SunshineError::InvalidDayTimeKey(_))),
                "{day_time}: {result:?}"
            );
            let result = client
                .query_location()
                .location(LatLon(42.36, -71.09))
                .day_time(day_time)
                .call()
                .await;
            assert!(matches!(result, Err(SunshineError::InvalidDayTimeKey(_))));
        }
        assert_eq!(server.hits(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_download_persists_nothing() -> Result<(), SunshineError> {
        let server = serve(404, Vec::new()).await;
        let cache_dir = TempDir::new().unwrap();
        let client = client(&server, cache_dir.path()).await?;

        let result = client.station_dataset("725090").await;
        assert!(matches!(
            result,
            Err(SunshineError::IrradianceData(IrradianceDataError::HttpStatus { .. }))
        ));
        assert!(!cache_dir.path().join("725090.csv").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_year_in_archive() -> Result<(), SunshineError> {
        let archive = station_archive("725090", &[1995, 1997], &[1]).await;
        let server = serve(200, archive).await;
        let cache_dir = TempDir::new().unwrap();
        let client = client(&server, cache_dir.path()).await?;

        let result = client.station_dataset("725090").await;
        assert!(matches!(
            result,
            Err(SunshineError::IrradianceData(IrradianceDataError::MissingEntry { .. }))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_invalidate_refetches() -> Result<(), SunshineError> {
        let archive = station_archive("725090", &[1995, 1996, 1997], &[17]).await;
        let server = serve(200, archive).await;
        let cache_dir = TempDir::new().unwrap();
        let client = client(&server, cache_dir.path()).await?;

        client.station_dataset("725090").await?;
        client.invalidate("725090").await?;
        assert!(!cache_dir.path().join("725090.csv").exists());
        client.station_dataset("725090").await?;
        assert_eq!(server.hits(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let server = serve(200, Vec::new()).await;
        let cache_dir = TempDir::new().unwrap();
        let mut config = config(&server, cache_dir.path());
        config.years = vec![1995, 1997];
        assert!(matches!(
            Sunshine::new(config, geocoder()).await,
            Err(SunshineError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_mapping_file() {
        let server = serve(200, Vec::new()).await;
        let cache_dir = TempDir::new().unwrap();
        let mut config = config(&server, cache_dir.path());
        config.mapping_path = cache_dir.path().join("absent.csv");
        assert!(matches!(
            Sunshine::new(config, geocoder()).await,
            Err(SunshineError::LocateStation(_))
        ));
    }

    #[tokio::test]
    #[ignore = "requires network access to nominatim.openstreetmap.org and ncei.noaa.gov"]
    async fn test_live_mit_query() -> Result<(), SunshineError> {
        let cache_dir = TempDir::new().unwrap();
        let config = SunshineConfig::builder()
            .mapping_path(MAPPING)
            .cache_dir(cache_dir.path())
            .build();
        let client = Sunshine::new(config, NominatimGeocoder::new()).await?;

        let report = client.query().address(MIT).day_time("01-01_17:00").call().await?;
        assert_eq!(report.station.code, "725090");
        assert_mit_record(&report.record);
        Ok(())
    }
}
