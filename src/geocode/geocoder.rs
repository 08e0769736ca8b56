//! The address boundary: anything that turns a free-form address into coordinates.

use crate::geocode::error::GeocodeError;
use crate::types::location::LatLon;
use std::collections::HashMap;
use std::future::Future;

/// Resolves a street address to a coordinate.
///
/// Implementations return [`GeocodeError::AddressNotFound`] when the address
/// cannot be resolved.
pub trait Geocoder: Send + Sync {
    fn resolve(&self, address: &str) -> impl Future<Output = Result<LatLon, GeocodeError>> + Send;
}

/// A geocoder backed by a fixed address table. Lookups ignore surrounding whitespace.
///
/// # Examples
///
/// ```
/// use sunshine::{Geocoder, LatLon, StaticGeocoder};
///
/// # #[tokio::main]
/// # async fn main() {
/// let geocoder = StaticGeocoder::new()
///     .with_address("77 Massachusetts Ave, Cambridge, MA 02139, United States",
///                   LatLon(42.3592962, -71.09308333242714));
///
/// let mit = geocoder
///     .resolve("77 Massachusetts Ave, Cambridge, MA 02139, United States")
///     .await
///     .unwrap();
/// assert_eq!(mit, LatLon(42.3592962, -71.09308333242714));
/// assert!(geocoder.resolve("Nowhere").await.is_err());
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticGeocoder {
    addresses: HashMap<String, LatLon>,
}

impl StaticGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_address(mut self, address: impl Into<String>, location: LatLon) -> Self {
        self.insert(address, location);
        self
    }

    pub fn insert(&mut self, address: impl Into<String>, location: LatLon) {
        self.addresses
            .insert(address.into().trim().to_string(), location);
    }
}

impl Geocoder for StaticGeocoder {
    async fn resolve(&self, address: &str) -> Result<LatLon, GeocodeError> {
        self.addresses
            .get(address.trim())
            .copied()
            .ok_or_else(|| GeocodeError::AddressNotFound(address.to_string()))
    }
}
