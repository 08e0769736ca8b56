use crate::irradiance_data::error::IrradianceDataError;
use crate::types::config::SunshineConfig;
use futures_util::TryStreamExt;
use log::{info, warn};
use reqwest::Client;
use tokio::io::AsyncReadExt;
use tokio_util::io::StreamReader;

/// Downloads the compressed multi-year archive of a station.
///
/// One GET per call, no retries. Only a 2xx status counts as success.
pub struct ArchiveFetcher {
    config: SunshineConfig,
    download_client: Client,
}

impl ArchiveFetcher {
    pub fn new(config: &SunshineConfig) -> Self {
        ArchiveFetcher {
            config: config.clone(),
            download_client: Client::new(),
        }
    }

    /// Returns the raw archive bytes, still compressed.
    pub async fn fetch(&self, station: &str) -> Result<Vec<u8>, IrradianceDataError> {
        let url = self.config.archive_url(station);
        info!("Downloading archive from {}", url);

        let response = self
            .download_client
            .get(&url)
            .send()
            .await
            .map_err(|e| IrradianceDataError::NetworkRequest(url.clone(), e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("HTTP status {} for {}", status, url);
            return Err(IrradianceDataError::HttpStatus { url, status });
        }

        let stream = response
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
        let mut stream_reader = StreamReader::new(stream);
        let mut archive = Vec::new();
        stream_reader
            .read_to_end(&mut archive)
            .await
            .map_err(IrradianceDataError::DownloadIo)?;
        info!(
            "Downloaded {} bytes for station {}",
            archive.len(),
            station
        );
        Ok(archive)
    }
}
