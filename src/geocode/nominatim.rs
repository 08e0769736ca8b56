use crate::geocode::error::GeocodeError;
use crate::geocode::geocoder::Geocoder;
use crate::types::location::LatLon;
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;

const DEFAULT_ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";
const DEFAULT_USER_AGENT: &str = "ge_sunshine";

/// A single search hit. Nominatim encodes coordinates as strings.
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

/// Geocoder using the OpenStreetMap Nominatim search API.
///
/// Only the best match (`limit=1`) is used.
pub struct NominatimGeocoder {
    client: Client,
    endpoint: String,
    user_agent: String,
}

impl Default for NominatimGeocoder {
    fn default() -> Self {
        Self::new()
    }
}

impl NominatimGeocoder {
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Nominatim's usage policy requires an identifying user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

impl Geocoder for NominatimGeocoder {
    async fn resolve(&self, address: &str) -> Result<LatLon, GeocodeError> {
        debug!("Geocoding '{}' via {}", address, self.endpoint);
        let response = self
            .client
            .get(&self.endpoint)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| GeocodeError::NetworkRequest(self.endpoint.clone(), e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Geocoder returned {} for '{}'", status, address);
            return Err(GeocodeError::HttpStatus {
                url: self.endpoint.clone(),
                status,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| GeocodeError::NetworkRequest(self.endpoint.clone(), e))?;
        parse_search_response(address, &body)
    }
}

/// Picks the first place out of a Nominatim JSON search response.
fn parse_search_response(address: &str, body: &[u8]) -> Result<LatLon, GeocodeError> {
    let places: Vec<Place> = serde_json::from_slice(body)?;
    let place = places
        .into_iter()
        .next()
        .ok_or_else(|| GeocodeError::AddressNotFound(address.to_string()))?;

    let coordinate = |value: &str| {
        value
            .parse::<f64>()
            .map_err(|_| GeocodeError::InvalidCoordinate {
                address: address.to_string(),
                value: value.to_string(),
            })
    };
    Ok(LatLon(coordinate(&place.lat)?, coordinate(&place.lon)?))
}
