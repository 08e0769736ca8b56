use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("Unknown address '{0}'")]
    AddressNotFound(String),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Failed to parse geocoder response")]
    JsonParse(#[from] serde_json::Error),

    #[error("Geocoder returned an invalid coordinate '{value}' for '{address}'")]
    InvalidCoordinate { address: String, value: String },
}
